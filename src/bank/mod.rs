mod fission_bank;
mod secondary;
mod site;
mod source_bank;

pub use fission_bank::FissionBank;
pub use secondary::SecondaryBank;
pub use site::Site;
pub use source_bank::SourceBank;
