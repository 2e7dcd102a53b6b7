use hf_graph::PhysicalData;
use hf_graph::formulas::{
    area_from_pressure, calculate_w1, calculate_w2, solve_w12, static_pressure, wave_speed,
};
use proptest::prelude::*;

fn data(radius: f64, thickness: f64) -> PhysicalData {
    PhysicalData::set_from_data(4e5, thickness, 1.028e-3, 9.0, radius, 10.0).unwrap()
}

proptest! {
    #[test]
    fn invariants_recover_subsonic_states(
        radius in 0.1f64..1.5,
        thickness in 0.02f64..0.2,
        stretch in 0.5f64..2.0,
        mach in -0.5f64..0.5,
    ) {
        let d = data(radius, thickness);
        let a = stretch * d.a0;
        let q = mach * wave_speed(a, &d) * a;
        let (q2, a2) = solve_w12(calculate_w1(q, a, &d), calculate_w2(q, a, &d), &d);
        prop_assert!((a2 - a).abs() <= 1e-10 * a);
        prop_assert!((q2 - q).abs() <= 1e-9 * (1.0 + q.abs()));
    }

    #[test]
    fn pressure_grows_with_area(
        radius in 0.1f64..1.5,
        p in -1.0e4f64..1.0e5,
    ) {
        let d = data(radius, 0.067);
        let a = area_from_pressure(p, &d);
        prop_assert!(a > 0.0);
        prop_assert!((static_pressure(a, &d) - p).abs() <= 1e-8 * (1.0 + p.abs()));
        prop_assert!(static_pressure(1.01 * a, &d) > p);
    }
}
