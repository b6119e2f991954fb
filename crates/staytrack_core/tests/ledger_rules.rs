use chrono::{NaiveDate, TimeDelta};
use staytrack_core::{
    blocked_end_dates, blocked_start_dates, calculate_days, check_availability, Availability,
    BlockedDatesRequest, EngineError, ExemptionSnapshot, RecalcCoordinator, SweepGuard,
    SweepHorizon, Trip, TripSegment, Visa, VisaCategory,
};

/// Day 1 is 2025-01-01.
fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + TimeDelta::days(n - 1)
}

fn stay(country: &str, from: i64, to: i64) -> TripSegment {
    TripSegment::stay(country, day(from), day(to)).unwrap()
}

fn trip(segments: Vec<TripSegment>) -> Trip {
    Trip::new(segments, day(1)).unwrap()
}

fn no_exemptions(at: i64) -> ExemptionSnapshot {
    ExemptionSnapshot::empty(day(at))
}

fn request<'a>(evaluation: i64) -> BlockedDatesRequest<'a> {
    BlockedDatesRequest {
        evaluation_date: day(evaluation),
        bound_visa: None,
        exclude_trip_id: None,
        horizon: SweepHorizon::default(),
    }
}

#[test]
fn overlapping_stays_in_one_country_are_counted_once() {
    let trips = vec![trip(vec![stay("DE", 1, 5)]), trip(vec![stay("DE", 3, 8)])];

    let result = calculate_days(&trips, day(8), &no_exemptions(8)).unwrap();

    assert_eq!(result.total_days_used, 8);
    assert_eq!(result.remaining_days, 82);
    assert_eq!(result.days_per_country.get("DE"), Some(&8));
    assert_eq!(result.chargeable_days_per_country.get("DE"), Some(&8));
}

#[test]
fn overlapping_stays_across_countries_are_counted_once() {
    let trips = vec![trip(vec![stay("FR", 1, 5)]), trip(vec![stay("IT", 3, 8)])];

    let result = calculate_days(&trips, day(8), &no_exemptions(8)).unwrap();

    assert_eq!(result.total_days_used, 8);
    assert_eq!(result.days_per_country.get("FR"), Some(&5));
    assert_eq!(result.days_per_country.get("IT"), Some(&6));
}

#[test]
fn repeated_calculation_is_identical() {
    let trips = vec![
        trip(vec![stay("DE", 10, 40), stay("AT", 40, 52)]),
        trip(vec![stay("ES", 100, 130)]),
    ];
    let snapshot = no_exemptions(140);

    let first = calculate_days(&trips, day(140), &snapshot).unwrap();
    let second = calculate_days(&trips, day(140), &snapshot).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.total_days_used, 43 + 31);
}

#[test]
fn window_includes_anchor_minus_179_but_not_minus_180() {
    let anchor = 200;
    let at_edge = vec![trip(vec![stay("NL", anchor - 179, anchor - 179)])];
    let past_edge = vec![trip(vec![stay("NL", anchor - 180, anchor - 180)])];

    let counted = calculate_days(&at_edge, day(anchor), &no_exemptions(anchor)).unwrap();
    let dropped = calculate_days(&past_edge, day(anchor), &no_exemptions(anchor)).unwrap();

    assert_eq!(counted.total_days_used, 1);
    assert_eq!(counted.period_start, day(anchor - 179));
    assert_eq!(dropped.total_days_used, 0);
}

#[test]
fn ceiling_is_inclusive_at_ninety() {
    let at_ceiling = vec![trip(vec![stay("BE", 1, 90)])];
    let over = vec![trip(vec![stay("BE", 1, 91)])];

    let ninety = calculate_days(&at_ceiling, day(91), &no_exemptions(91)).unwrap();
    let ninety_one = calculate_days(&over, day(91), &no_exemptions(91)).unwrap();

    assert_eq!(ninety.total_days_used, 90);
    assert!(!ninety.is_over_limit);
    assert!(ninety.is_near_limit);
    assert_eq!(ninety.remaining_days, 0);

    assert_eq!(ninety_one.total_days_used, 91);
    assert!(ninety_one.is_over_limit);
    assert_eq!(ninety_one.remaining_days, 0);
}

#[test]
fn near_limit_starts_at_seventy_five() {
    let trips = vec![trip(vec![stay("PT", 1, 74)])];
    assert!(!calculate_days(&trips, day(74), &no_exemptions(74)).unwrap().is_near_limit);

    let trips = vec![trip(vec![stay("PT", 1, 75)])];
    assert!(calculate_days(&trips, day(75), &no_exemptions(75)).unwrap().is_near_limit);
}

#[test]
fn transit_days_are_never_counted() {
    let trips = vec![trip(vec![
        TripSegment::transit("CH", day(1), day(1)).unwrap(),
        stay("FR", 2, 4),
    ])];

    let result = calculate_days(&trips, day(10), &no_exemptions(10)).unwrap();

    assert_eq!(result.total_days_used, 3);
    assert!(!result.days_per_country.contains_key("CH"));
}

#[test]
fn exempt_country_contributes_zero_but_keeps_statistics() {
    let permit = Visa::new(
        "RP-1",
        VisaCategory::ResidencePermit,
        Some("pl"),
        day(1),
        day(365),
    )
    .unwrap();
    let trips = vec![trip(vec![stay("PL", 1, 200)])];
    let snapshot = ExemptionSnapshot::resolve([&permit], day(200));

    let result = calculate_days(&trips, day(200), &snapshot).unwrap();

    assert_eq!(result.total_days_used, 0);
    assert!(result.exempt_countries.contains("PL"));
    assert_eq!(result.days_per_country.get("PL"), Some(&180));
    assert!(!result.chargeable_days_per_country.contains_key("PL"));
}

#[test]
fn expired_permit_no_longer_exempts() {
    let permit = Visa::new(
        "RP-2",
        VisaCategory::TypeD,
        Some("PL"),
        day(1),
        day(50),
    )
    .unwrap();
    let trips = vec![trip(vec![stay("PL", 10, 20)])];
    let snapshot = ExemptionSnapshot::resolve([&permit], day(60));

    let result = calculate_days(&trips, day(60), &snapshot).unwrap();

    assert!(snapshot.countries().is_empty());
    assert_eq!(result.total_days_used, 11);
}

#[test]
fn snapshot_for_another_date_is_rejected() {
    let trips = vec![trip(vec![stay("DE", 1, 10)])];

    let err = calculate_days(&trips, day(20), &no_exemptions(19)).unwrap_err();

    assert_eq!(
        err,
        EngineError::InconsistentExemptionSnapshot {
            resolved_for: day(19),
            evaluated_at: day(20),
        }
    );
}

#[test]
fn trips_starting_after_anchor_are_not_counted() {
    let trips = vec![trip(vec![stay("DE", 1, 10)]), trip(vec![stay("DE", 30, 40)])];

    let result = calculate_days(&trips, day(20), &no_exemptions(20)).unwrap();

    assert_eq!(result.total_days_used, 10);
}

#[test]
fn sixty_plus_thirty_five_is_rejected_and_end_ninety_is_the_last_selectable() {
    let existing = vec![trip(vec![stay("DE", 1, 60)])];
    let snapshot = no_exemptions(1);

    let too_long = check_availability(&existing, &[stay("DE", 61, 95)], &snapshot, None).unwrap();
    assert!(!too_long.is_available());

    let exact = check_availability(&existing, &[stay("DE", 61, 90)], &snapshot, None).unwrap();
    assert_eq!(exact, Availability::Available);

    let blocked = blocked_end_dates(
        &existing,
        &snapshot,
        &request(1),
        day(61),
        &SweepGuard::unguarded(),
    )
    .unwrap();
    assert!(!blocked.contains(&day(90)));
    assert!(blocked.contains(&day(91)));
    assert!(blocked.contains(&day(95)));
    assert!(blocked.contains(&day(60)));
}

#[test]
fn breach_after_proposal_end_is_detected() {
    let existing = vec![trip(vec![stay("FR", 150, 239)])];
    let snapshot = no_exemptions(1);

    let result = check_availability(&existing, &[stay("FR", 60, 70)], &snapshot, None).unwrap();

    assert_eq!(
        result,
        Availability::Unavailable {
            anchor: day(229),
            days_used: 91,
        }
    );
}

#[test]
fn editing_excludes_the_stored_version_of_the_trip() {
    let stored = trip(vec![stay("ES", 1, 90)]);
    let id = stored.id;
    let existing = vec![stored];
    let snapshot = no_exemptions(1);
    let shifted = [stay("ES", 2, 91)];

    let as_new = check_availability(&existing, &shifted, &snapshot, None).unwrap();
    let as_edit = check_availability(&existing, &shifted, &snapshot, Some(id)).unwrap();

    assert!(!as_new.is_available());
    assert!(as_edit.is_available());
}

#[test]
fn fully_exempt_proposal_is_available_even_over_ceiling() {
    let existing = vec![trip(vec![stay("DE", 1, 90)])];
    let snapshot = ExemptionSnapshot::from_countries(day(1), ["IT"]);

    let result = check_availability(&existing, &[stay("IT", 91, 150)], &snapshot, None).unwrap();

    assert!(result.is_available());
}

#[test]
fn empty_proposal_is_invalid_input() {
    let err = check_availability(&[], &[], &no_exemptions(1), None).unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[test]
fn saturated_windows_block_starts_until_they_roll_off() {
    let existing = vec![trip(vec![stay("DE", 1, 90)])];
    let snapshot = no_exemptions(1);

    let blocked =
        blocked_start_dates(&existing, &snapshot, &request(1), &SweepGuard::unguarded()).unwrap();

    assert!(blocked.contains(&day(45)));
    assert!(blocked.contains(&day(91)));
    assert!(blocked.contains(&day(180)));
    assert!(!blocked.contains(&day(181)));
}

#[test]
fn selectable_starts_agree_with_the_checker() {
    let existing = vec![
        trip(vec![stay("DE", 1, 45)]),
        trip(vec![stay("FR", 70, 100), stay("BE", 100, 114)]),
    ];
    let snapshot = no_exemptions(1);

    let blocked =
        blocked_start_dates(&existing, &snapshot, &request(1), &SweepGuard::unguarded()).unwrap();

    assert!(blocked.contains(&day(50)));
    assert!(!blocked.contains(&day(181)));

    for n in 1..=360 {
        let date = day(n);
        if existing.iter().any(|trip| trip.covers(date)) {
            assert!(blocked.contains(&date), "day {n} lies inside a trip");
            continue;
        }
        let single_day = [stay("NL", n, n)];
        let available = check_availability(&existing, &single_day, &snapshot, None)
            .unwrap()
            .is_available();
        assert_eq!(blocked.contains(&date), !available, "day {n}");
    }
}

#[test]
fn bound_visa_blocks_dates_outside_validity() {
    let visa = Visa::new("C-1", VisaCategory::TypeC, None, day(100), day(200)).unwrap();
    let req = BlockedDatesRequest {
        bound_visa: Some(&visa),
        ..request(1)
    };

    let starts = blocked_start_dates(&[], &no_exemptions(1), &req, &SweepGuard::unguarded()).unwrap();
    let ends = blocked_end_dates(&[], &no_exemptions(1), &req, day(150), &SweepGuard::unguarded())
        .unwrap();

    assert!(starts.contains(&day(99)));
    assert!(!starts.contains(&day(100)));
    assert!(!starts.contains(&day(200)));
    assert!(starts.contains(&day(201)));
    assert!(!ends.contains(&day(200)));
    assert!(ends.contains(&day(201)));
}

#[test]
fn end_dates_stop_at_the_next_existing_trip() {
    let existing = vec![trip(vec![stay("SE", 50, 55)])];

    let blocked = blocked_end_dates(
        &existing,
        &no_exemptions(1),
        &request(1),
        day(40),
        &SweepGuard::unguarded(),
    )
    .unwrap();

    assert!(!blocked.contains(&day(49)));
    assert!(blocked.contains(&day(50)));
    assert!(blocked.contains(&day(60)));
}

#[test]
fn newer_request_supersedes_running_sweep() {
    let coordinator = RecalcCoordinator::new();
    let stale = coordinator.begin();
    let fresh = coordinator.begin();
    let existing = vec![trip(vec![stay("DE", 1, 30)])];

    let stale_result = blocked_start_dates(&existing, &no_exemptions(1), &request(1), &stale);
    let fresh_result = blocked_start_dates(&existing, &no_exemptions(1), &request(1), &fresh);

    assert_eq!(stale_result.unwrap_err(), EngineError::Superseded);
    assert!(fresh_result.is_ok());
}
