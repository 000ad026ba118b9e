//! Checks a solved schedule against every hard rule, straight from the roster
//! rather than through the generated model.

use crate::config::SolveConfig;
use crate::roster::Roster;
use crate::solver::ShiftAssignment;

pub fn assert_schedule_holds(roster: &Roster, config: &SolveConfig, assignment: &ShiftAssignment) {
    let matrix = roster.matrix();
    let name = |m: usize| matrix.manager_name(m);
    let label = |n: usize| matrix.night_label(n);

    assert_eq!(assignment.manager_count(), matrix.manager_count());
    assert_eq!(assignment.night_count(), matrix.night_count());

    for n in 0..matrix.night_count() {
        assert_eq!(
            assignment.managers_on(n).count(),
            config.shifts_per_night as usize,
            "coverage on {}",
            label(n)
        );
    }

    for m in 0..matrix.manager_count() {
        let worked = assignment.nights_of(m).count() as u32;
        assert!(
            (config.min_nights..=config.max_nights).contains(&worked),
            "{} works {} nights",
            name(m),
            worked
        );

        for n in assignment.nights_of(m) {
            assert!(
                matrix.level(m, n) >= config.availability_level,
                "{} is not available on {}",
                name(m),
                label(n)
            );
        }
    }

    for n in 0..matrix.night_count() {
        for &(a, b) in roster.together() {
            assert_eq!(assignment.works(a, n), assignment.works(b, n), "together on {}", label(n));
        }
        for &(a, b) in roster.apart() {
            assert!(!(assignment.works(a, n) && assignment.works(b, n)), "apart on {}", label(n));
        }
    }

    let gap = config.min_gap as usize;
    for (&m, pinned) in roster.pins() {
        for &n in pinned {
            assert!(assignment.works(m, n), "{} pinned to {}", name(m), label(n));
        }
    }

    for m in 0..matrix.manager_count() {
        let pinned: Vec<usize> = roster
            .pins()
            .get(&m)
            .map(|nights| nights.iter().copied().collect())
            .unwrap_or_default();
        let exempt = pinned.windows(2).any(|pair| pair[1] - pair[0] <= gap);
        if exempt {
            continue;
        }

        let nights: Vec<usize> = assignment.nights_of(m).collect();
        for pair in nights.windows(2) {
            assert!(
                pair[1] - pair[0] > gap,
                "{} works {} and {} within the gap",
                name(m),
                label(pair[0]),
                label(pair[1])
            );
        }
    }
}
