mod binary_format;
mod helper_functions;
#[cfg(test)]
mod mock_rng;
#[cfg(test)]
mod testing;

pub use binary_format::{is_ascii_file, write_isotope_library, XsMmap};

pub use helper_functions::{
    compute_kT_from_temperature, dot, normalize, isotropic_direction,
    rotate_direction,
};

#[cfg(test)]
pub use mock_rng::MockRng;
#[cfg(test)]
pub use testing::{fissile_isotope, moderator_isotope, test_materials, test_store, ISOTOPES_DIR};
