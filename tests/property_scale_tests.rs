use std::f64::consts::TAU;

use proptest::prelude::*;
use scrolly_rs::core::density::sample_positions;
use scrolly_rs::core::{LinearScale, kernel_density, pie_angles};

proptest! {
    #[test]
    fn linear_scale_round_trip_property(
        domain_start in -1_000_000.0f64..1_000_000.0,
        domain_span in 0.001f64..1_000_000.0,
        value_factor in 0.0f64..1.0
    ) {
        let domain_end = domain_start + domain_span;
        let value = domain_start + value_factor * domain_span;

        let scale = LinearScale::new((domain_start, domain_end), (0.0, 2048.0)).expect("valid scale");
        let recovered = scale.invert(scale.map(value));

        prop_assert!((recovered - value).abs() <= 1e-6 * domain_span.max(1.0));
    }

    #[test]
    fn ticks_stay_inside_domain(max in 0.5f64..100_000.0, count in 2usize..20) {
        let scale = LinearScale::from_max(max, (0.0, 500.0)).expect("valid scale");
        let ticks = scale.ticks(count);

        prop_assert!(!ticks.is_empty());
        for pair in ticks.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        for tick in ticks {
            prop_assert!(tick >= -1e-9 && tick <= max + 1e-9);
        }
    }

    #[test]
    fn pie_angles_cover_full_turn(values in prop::collection::vec(0.0f64..1_000.0, 1..12)) {
        prop_assume!(values.iter().sum::<f64>() > 1e-6);
        let arcs = pie_angles(&values);

        prop_assert_eq!(arcs.len(), values.len());
        let total: f64 = arcs.iter().map(|arc| arc.sweep()).sum();
        prop_assert!((total - TAU).abs() <= 1e-9);
        for arc in arcs {
            prop_assert!(arc.sweep() >= 0.0);
        }
    }

    #[test]
    fn kernel_density_integrates_to_one(
        values in prop::collection::vec(0.0f64..100.0, 1..40),
        bandwidth in 2.0f64..20.0
    ) {
        let start = -bandwidth - 1.0;
        let end = 100.0 + bandwidth + 1.0;
        let count = 2_001;
        let xs = sample_positions(start, end, count);
        let points = kernel_density(&values, &xs, bandwidth);
        let step = (end - start) / (count - 1) as f64;

        let area: f64 = points.windows(2)
            .map(|pair| (pair[0].density + pair[1].density) * 0.5 * step)
            .sum();
        prop_assert!((area - 1.0).abs() <= 1e-2);
        prop_assert!(points.iter().all(|point| point.density >= 0.0));
    }
}
