use proptest::prelude::*;

use kcode_rs::bank::{Site, SourceBank};
use kcode_rs::driver::EntropyMesh;
use kcode_rs::geometry::{BoundaryCondition, CsgToken, Region, Surface, SurfaceKind};
use kcode_rs::interpolation::InterpolationScheme;
use kcode_rs::nuclear_data::{IsotopeData, MaterialDefinition, NuclearDataStore, ReactionData};
use kcode_rs::random::{HistoryRng, RandomSource};
use kcode_rs::transport::physics::{elastic_scatter, fission_site_count};
use kcode_rs::utils::{dot, isotropic_direction};

fn unit_vector() -> impl Strategy<Value = [f64; 3]> {
    (0u64..1_000_000).prop_map(|seed| isotropic_direction(&mut HistoryRng::for_history(seed, 0)))
}

fn spheres() -> Vec<Surface> {
    (1..=3)
        .map(|id| {
            let kind = SurfaceKind::Sphere { x0: id as f64 - 2.0, y0: 0.0, z0: 0.0, r: 1.5 };
            Surface::new(id, kind, BoundaryCondition::Transmit).unwrap()
        })
        .collect()
}

fn parse(expression: &str) -> Region {
    let tokens = CsgToken::tokenize(expression).unwrap();
    Region::parse(&tokens, |id| (1..=3).contains(&id).then(|| id as usize - 1)).unwrap()
}

fn tabulated(name: &str, energy: Vec<f64>, elastic: Vec<f64>, capture: Vec<f64>) -> IsotopeData {
    IsotopeData {
        name: name.to_string(),
        awr: 15.9,
        temperature: 293.6,
        interpolation: InterpolationScheme::LinLin,
        energy,
        total: None,
        reactions: vec![
            ReactionData { mt: 2, q_value: 0.0, threshold_index: 0, xs: elastic },
            ReactionData { mt: 102, q_value: 5.0, threshold_index: 0, xs: capture },
        ],
        nu: None,
        fission_spectrum: None,
        thermal: vec![],
    }
}

// Two isotopes whose grids interleave on the union grid
fn interleaved_store() -> NuclearDataStore {
    let isotopes = [
        tabulated("A", vec![1e-5, 1e-2, 1.0, 5.0, 20.0], vec![8.0, 3.0, 6.0, 2.0, 1.0], vec![40.0, 1.0, 0.5, 0.1, 0.2]),
        tabulated("B", vec![1e-5, 0.5, 2.0, 20.0], vec![1.0, 9.0, 4.0, 4.5], vec![0.3, 0.3, 2.0, 0.01]),
    ];
    let materials = [MaterialDefinition::new(1, "mix", &[("A", 0.03), ("B", 0.01)])];
    NuclearDataStore::new(&isotopes, &materials).unwrap()
}

proptest! {
    #[test]
    fn complement_is_the_opposite_region(x in -4.0f64..4.0, y in -2.0f64..2.0, z in -2.0f64..2.0, u in unit_vector()) {
        let surfaces = spheres();
        let p = [x, y, z];
        for expression in ["-1 2", "-1 : -3", "(-1 : -2) 3"] {
            let region = parse(expression);
            let complement = parse(&format!("~({})", expression));
            prop_assert_ne!(
                region.contains(&p, &u, &surfaces, None),
                complement.contains(&p, &u, &surfaces, None)
            );
        }
    }

    #[test]
    fn distance_lands_on_the_surface(x in -0.9f64..0.9, y in -0.9f64..0.9, z in -0.9f64..0.9, u in unit_vector()) {
        let p = [x, y, z];
        // Every closed surface encloses the start point, so a crossing lies ahead
        let closed = [
            SurfaceKind::Sphere { x0: 0.0, y0: 0.0, z0: 0.0, r: 2.0 },
            SurfaceKind::CylinderX { y0: 0.1, z0: 0.0, r: 2.0 },
            SurfaceKind::CylinderY { x0: 0.0, z0: -0.2, r: 1.5 },
            SurfaceKind::CylinderZ { x0: 0.3, y0: 0.3, r: 2.5 },
            SurfaceKind::Box { min: [-2.0, -1.5, -1.0], max: [1.0, 3.0, 2.5] },
            // Ellipsoid with semi axes 2, 3 and 4
            SurfaceKind::Quadric { a: 0.25, b: 1.0 / 9.0, c: 1.0 / 16.0, d: 0.0, e: 0.0, f: 0.0, g: 0.0, h: 0.0, j: 0.0, k: -1.0 },
        ];
        for kind in closed {
            let surface = Surface::new(1, kind, BoundaryCondition::Vacuum).unwrap();
            let d = surface.distance(&p, &u, false);
            prop_assert!(d.is_some(), "no crossing of {:?}", surface.kind);
            let d = d.unwrap();
            prop_assert!(d > 0.0);
            let hit = [p[0] + d * u[0], p[1] + d * u[1], p[2] + d * u[2]];
            prop_assert!(surface.evaluate(&hit).abs() < 1e-9, "{:?} missed by {}", surface.kind, surface.evaluate(&hit));
        }

        // A plane is crossed only when moving towards it
        let planes = [
            (SurfaceKind::PlaneX { x0: 1.5 }, [1.0, 0.0, 0.0]),
            (SurfaceKind::PlaneY { y0: -1.5 }, [0.0, 1.0, 0.0]),
            (SurfaceKind::PlaneZ { z0: 1.2 }, [0.0, 0.0, 1.0]),
            (SurfaceKind::Plane { a: 1.0, b: -2.0, c: 0.5, d: 4.0 }, [1.0, -2.0, 0.5]),
        ];
        for (kind, normal) in planes {
            let surface = Surface::new(1, kind, BoundaryCondition::Vacuum).unwrap();
            let towards = (surface.evaluate(&p) < 0.0) == (dot(&u, &normal) > 0.0);
            match surface.distance(&p, &u, false) {
                Some(d) => {
                    prop_assert!(towards && d > 0.0);
                    let hit = [p[0] + d * u[0], p[1] + d * u[1], p[2] + d * u[2]];
                    prop_assert!(surface.evaluate(&hit).abs() < 1e-9);
                }
                None => prop_assert!(!towards),
            }
        }
    }

    #[test]
    fn total_cross_section_between_grid_neighbours(log_energy in 1e-5f64.ln()..20f64.ln()) {
        let store = interleaved_store();
        let material = store.material_index(1).unwrap();
        let energy = log_energy.exp().clamp(1e-5, 20.0);
        let grid = store.grid().energy();
        let upper = grid.partition_point(|&e| e < energy).clamp(1, grid.len() - 1);
        let total = |e: f64| store.total_macroscopic_cross_section(material, e).unwrap();

        let (low, high) = (total(grid[upper - 1]), total(grid[upper]));
        let value = total(energy);
        prop_assert!(value >= low.min(high) - 1e-12 && value <= low.max(high) + 1e-12);
    }

    #[test]
    fn reflection_keeps_unit_length(u in unit_vector(), v in unit_vector()) {
        let sphere = Surface::new(1, SurfaceKind::Sphere { x0: 0.0, y0: 0.0, z0: 0.0, r: 3.0 }, BoundaryCondition::Reflect).unwrap();
        let p = [3.0 * v[0], 3.0 * v[1], 3.0 * v[2]];
        let reflected = sphere.reflect(&p, &u).unwrap();
        prop_assert!((dot(&reflected, &reflected) - 1.0).abs() < 1e-12);
        // Normal component flips, tangential component is kept
        prop_assert!((dot(&reflected, &v) + dot(&u, &v)).abs() < 1e-12);
    }

    #[test]
    fn promote_yields_exact_count(n_sites in 1usize..200, n_particles in 1usize..500, cycle in 0usize..100) {
        let sites: Vec<Site> = (0..n_sites)
            .map(|i| Site { weight: 0.5 + (i % 3) as f64, ..Site::new([i as f64, 0.0, 0.0], [0.0, 0.0, 1.0], 1.0) })
            .collect();
        let mut rng = HistoryRng::new(7, kcode_rs::random::RngStream::Bank, cycle as u64);
        let bank = SourceBank::promote(&sites, n_particles, cycle, &mut rng).unwrap();
        prop_assert_eq!(bank.len(), n_particles);
        prop_assert!(bank.iter().all(|site| site.weight == 1.0));
        // Combing keeps the bank order
        prop_assert!(bank.windows(2).all(|pair| pair[0].position[0] <= pair[1].position[0]));
    }

    #[test]
    fn elastic_energy_within_kinematic_limits(awr in 0.5f64..250.0, energy in 1e-9f64..20.0, u in unit_vector(), seed in 0u64..10_000) {
        let mut rng = HistoryRng::for_history(seed, 0);
        let out = elastic_scatter(awr, energy, u, &mut rng);
        let alpha = ((awr - 1.0) / (awr + 1.0)).powi(2);
        prop_assert!(out.energy <= energy * (1.0 + 1e-12));
        prop_assert!(out.energy >= alpha * energy * (1.0 - 1e-12));
        prop_assert!((dot(&out.direction, &out.direction) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fission_site_count_brackets_expectation(nu in 0.0f64..5.0, weight in 0.0f64..2.0, seed in 0u64..10_000) {
        let xi = HistoryRng::for_history(seed, 0).next_unit().value();
        let count = fission_site_count(nu, weight, xi) as f64;
        let expected = nu * weight;
        prop_assert!(count >= expected.floor() && count <= expected.floor() + 1.0);
    }

    #[test]
    fn entropy_is_bounded(positions in prop::collection::vec((-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0), 0..100)) {
        let mesh = EntropyMesh { lower_left: [-1.0; 3], upper_right: [1.0; 3], dimension: [2, 3, 4] };
        let sites: Vec<Site> = positions.iter().map(|&(x, y, z)| Site::new([x, y, z], [1.0, 0.0, 0.0], 1.0)).collect();
        let entropy = mesh.entropy(&sites);
        prop_assert!(entropy >= 0.0);
        prop_assert!(entropy <= (mesh.bins() as f64).log2() + 1e-12);
    }
}
