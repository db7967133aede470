use gcodepin_camtools::{
    clip_structure, extrusion_length, frustum_volume, place_pins, simple_volume,
    structure_volume, FeasibilityError, PinLayoutPlanner, ScheduleGenerator,
};
use gcodepin_core::{
    CrossSection, PartPlacement, PinHeight, PinRequest, PinShape, RivetProfile, StaggerRule,
};
use proptest::prelude::*;

fn scenario_request() -> PinRequest {
    PinRequest {
        shape: PinShape::Square,
        dimension: 0.5,
        count_largest_side: 2,
        count_smallest_side: 1,
        height: PinHeight::Layers(5),
        layer_height: 0.12,
    }
}

fn scenario_section() -> CrossSection {
    CrossSection {
        largest_side: 10.0,
        smallest_side: 4.0,
        least_edge_margin: 0.5,
        infill_percentage: 1.0,
    }
}

#[test]
fn test_ten_by_four_square_pins() {
    let cs = scenario_section();
    let req = scenario_request();
    let layout = PinLayoutPlanner::new(&cs, &req).plan().unwrap();

    assert_eq!(layout.pin_count(), 2);
    assert!((layout.spec.height_mm - 0.6).abs() < 1e-9);
    assert_eq!(layout.spec.height_layers, 5);
    assert!((layout.achieved_infill - 1.25).abs() < 1e-9);
    assert_eq!(layout.positions[0].x, 3.25);
    assert_eq!(layout.positions[0].y, 2.0);
    assert_eq!(layout.positions[1].x, 6.75);
}

#[test]
fn test_ten_by_four_margin_check() {
    let cs = CrossSection {
        least_edge_margin: 4.7,
        ..scenario_section()
    };
    let err = PinLayoutPlanner::new(&cs, &scenario_request())
        .plan()
        .unwrap_err();
    match err {
        FeasibilityError::MarginTooSmall { axis, margin, .. } => {
            assert_eq!(axis, "largest_side");
            assert!((margin - 4.63).abs() < 1e-9);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_circular_pin_extrusion_length() {
    // 2.75 mm diameter, 5 layers of 0.1 mm
    let length = extrusion_length(simple_volume(PinShape::Circular, 2.75, 0.5), 1.0);
    let expected = (1.375_f64 * 1.375 * 0.5) / (0.875 * 0.875);
    assert!((length - expected).abs() < 1e-12);
    assert!((length - 1.2347).abs() < 1e-4);
}

#[test]
fn test_rivet_full_stack_equals_section_sum() {
    let rivet = RivetProfile {
        cone_radius: 1.0,
        cone_height: 0.4,
        cylinder_radius: 0.7,
        cylinder_height: 0.3,
    };
    let sections = clip_structure(&rivet, 0.0, rivet.nominal_height()).unwrap();
    let independent = frustum_volume(0.4, 1.0, 0.7)
        + frustum_volume(0.3, 0.7, 0.7)
        + frustum_volume(0.4, 0.7, 1.0);
    assert!((structure_volume(&sections) - independent).abs() < 1e-12);
}

proptest! {
    #[test]
    fn prop_planner_respects_infill_tolerance(
        largest in 4.0f64..40.0,
        smallest in 2.0f64..20.0,
        dimension in 0.2f64..3.0,
        nx in 1u32..6,
        ny in 1u32..4,
        infill in 0.5f64..40.0,
        square in any::<bool>(),
    ) {
        let cs = CrossSection {
            largest_side: largest.max(smallest),
            smallest_side: smallest.min(largest),
            least_edge_margin: 0.2,
            infill_percentage: infill,
        };
        let req = PinRequest {
            shape: if square { PinShape::Square } else { PinShape::Circular },
            dimension,
            count_largest_side: nx,
            count_smallest_side: ny,
            height: PinHeight::Layers(4),
            layer_height: 0.1,
        };
        if let Ok(layout) = PinLayoutPlanner::new(&cs, &req).plan() {
            prop_assert!((layout.achieved_infill - infill).abs() <= 1.0);
            prop_assert_eq!(layout.pin_count(), (nx * ny) as usize);
        }
    }

    #[test]
    fn prop_placement_is_rigid(
        rotation in -360.0f64..360.0,
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
    ) {
        let cs = CrossSection {
            largest_side: 20.0,
            smallest_side: 10.0,
            least_edge_margin: 0.5,
            infill_percentage: 4.0,
        };
        let req = PinRequest {
            shape: PinShape::Square,
            dimension: 1.0,
            count_largest_side: 4,
            count_smallest_side: 2,
            height: PinHeight::Layers(4),
            layer_height: 0.1,
        };
        let layout = PinLayoutPlanner::new(&cs, &req).plan().unwrap();
        let sets = place_pins(&layout, &cs, &[PartPlacement::new("p", x, y, rotation)]);
        let placed = &sets[0].positions;
        for i in 0..placed.len() {
            for j in (i + 1)..placed.len() {
                let before = layout.positions[i].distance_to(&layout.positions[j]);
                let after = placed[i].distance_to(&placed[j]);
                prop_assert!((before - after).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn prop_volume_monotonic_in_height(
        dimension in 0.1f64..5.0,
        h1 in 0.01f64..10.0,
        dh in 0.001f64..5.0,
        square in any::<bool>(),
    ) {
        let shape = if square { PinShape::Square } else { PinShape::Circular };
        prop_assert!(simple_volume(shape, dimension, h1) < simple_volume(shape, dimension, h1 + dh));
    }

    #[test]
    fn prop_rivet_volume_monotonic(h1 in 0.0f64..1.0, dh in 0.01f64..0.1) {
        let rivet = RivetProfile {
            cone_radius: 1.0,
            cone_height: 0.4,
            cylinder_radius: 0.6,
            cylinder_height: 0.3,
        };
        let h2 = (h1 + dh).min(rivet.nominal_height());
        prop_assume!(h2 > h1 + 1e-6);
        let v1 = structure_volume(&clip_structure(&rivet, 0.0, h1).unwrap());
        let v2 = structure_volume(&clip_structure(&rivet, 0.0, h2).unwrap());
        prop_assert!(v1 < v2);
    }

    #[test]
    fn prop_schedule_covers_every_layer_once(
        phl in 1u32..12,
        total in 1u32..80,
        pins in 1usize..6,
        offset in prop::option::of(1u32..12),
    ) {
        let schedule = ScheduleGenerator::new(phl, total, 0.1)
            .with_rule(StaggerRule::Offset(offset))
            .generate(pins)
            .unwrap();
        for pin in 0..pins {
            let entries = schedule.entries_for_pin(pin);
            let mut next = 1;
            for entry in &entries {
                prop_assert_eq!(entry.bottom_layer(), next);
                prop_assert!(entry.height_layers >= 1);
                prop_assert!(entry.height_layers <= phl);
                next = entry.layer + 1;
            }
            prop_assert_eq!(next, total + 1);
            let covered: u32 = entries.iter().map(|e| e.height_layers).sum();
            prop_assert_eq!(covered, total);
        }
    }
}
