//! End-to-end flows through the engine facade.

use rust_decimal_macros::dec;
use tokio_test::assert_ok;

use flightsurety_common::{
    from_unix_seconds, Amount, Event, FlightKey, FlightStatus, FlightSuretyError, OracleIndex,
    Principal,
};
use flightsurety_engine::{FlightSurety, RegistrationOutcome, ReportOutcome, SuretyConfig};

fn airline(n: usize) -> Principal {
    Principal::new(format!("AIRLINE_{}", n))
}

fn oracle(n: usize) -> Principal {
    Principal::new(format!("ORACLE_{}", n))
}

fn owner() -> Principal {
    Principal::new("OWNER")
}

fn passenger() -> Principal {
    Principal::new("PASSENGER_1")
}

fn flight_of(n: usize) -> FlightKey {
    FlightKey::new(airline(n), "ND1309", from_unix_seconds(1_700_000_000).unwrap())
}

/// A1 funds, admits A2..A4 alone, and every founder funds.
fn with_founders() -> FlightSurety {
    let engine = FlightSurety::new(SuretyConfig::default()).unwrap();

    assert_ok!(engine.fund_airline(&airline(1), Amount::from_units(10)));
    for n in 2..=4 {
        assert_eq!(
            engine.register_airline(&airline(1), &airline(n)).unwrap(),
            RegistrationOutcome::Registered
        );
        assert_ok!(engine.fund_airline(&airline(n), Amount::from_units(10)));
    }
    engine
}

/// Admit and fund A5 by consensus of A1..A3.
fn with_fifth_airline() -> FlightSurety {
    let engine = with_founders();
    for voter in 1..=3 {
        engine.register_airline(&airline(voter), &airline(5)).unwrap();
    }
    assert_ok!(engine.fund_airline(&airline(5), Amount::from_units(10)));
    engine
}

/// Register oracles until `count` of them hold `index`; returns the holders.
fn oracles_holding(engine: &FlightSurety, index: OracleIndex, count: usize) -> Vec<Principal> {
    let mut holders = Vec::new();
    let mut n = 0;
    while holders.len() < count {
        n += 1;
        let indices = engine.register_oracle(&oracle(n), Amount::from_units(1)).unwrap();
        if indices.contains(&index) {
            holders.push(oracle(n));
        }
    }
    holders
}

#[test]
fn test_airline_consensus() {
    let engine = with_founders();
    assert_eq!(engine.registered_airline_count(), 4);

    let outcome = engine.register_airline(&airline(1), &airline(5)).unwrap();
    assert_eq!(outcome, RegistrationOutcome::VoteRecorded { votes: 1, required: 3 });

    // Repeat votes never count
    let outcome = engine.register_airline(&airline(1), &airline(5)).unwrap();
    assert_eq!(outcome, RegistrationOutcome::DuplicateVote { votes: 1, required: 3 });

    let outcome = engine.register_airline(&airline(2), &airline(5)).unwrap();
    assert_eq!(outcome, RegistrationOutcome::VoteRecorded { votes: 2, required: 3 });
    assert!(!engine.is_airline_registered(&airline(5)));

    let outcome = engine.register_airline(&airline(3), &airline(5)).unwrap();
    assert_eq!(outcome, RegistrationOutcome::Registered);
    assert!(engine.is_airline_registered(&airline(5)));
    assert!(!engine.is_airline_available(&airline(5)));

    let err = engine
        .fund_airline(&airline(5), Amount::from_units(5))
        .unwrap_err();
    assert!(matches!(err, FlightSuretyError::BelowMinimum { .. }));
    assert!(!engine.is_airline_available(&airline(5)));

    assert_ok!(engine.fund_airline(&airline(5), Amount::from_units(10)));
    assert!(engine.is_airline_available(&airline(5)));
    assert_eq!(engine.escrow_balance(), Amount::from_units(50));
    assert_eq!(engine.metrics().votes_cast, 2);
}

#[test]
fn test_flights_are_published_by_their_own_airline() {
    let engine = with_founders();
    let key = flight_of(1);

    assert_eq!(
        engine.register_flight(&airline(2), &key).unwrap_err(),
        FlightSuretyError::NotFunded(airline(2))
    );
    assert!(!engine.is_flight_registered(&key));

    assert_ok!(engine.register_flight(&airline(1), &key));
    assert!(engine.is_flight_registered(&key));
}

#[test]
fn test_airline_delay_pays_out_once() {
    let engine = with_fifth_airline();
    let key = flight_of(5);

    assert_ok!(engine.register_flight(&airline(5), &key));
    assert_ok!(engine.buy_insurance(&passenger(), &key, Amount::from_units(1)));

    let err = engine
        .buy_insurance(&passenger(), &key, Amount::from_units(1))
        .unwrap_err();
    assert_eq!(err.error_code(), "ALREADY_EXISTS");

    let index = engine.fetch_flight_status(&passenger(), &key).unwrap();
    let holders = oracles_holding(&engine, index, 4);

    assert_eq!(
        engine.submit_oracle_response(&holders[0], index, &key, 20).unwrap(),
        ReportOutcome::Recorded { count: 1 }
    );
    assert_eq!(
        engine.submit_oracle_response(&holders[1], index, &key, 20).unwrap(),
        ReportOutcome::Recorded { count: 2 }
    );
    assert_eq!(
        engine.submit_oracle_response(&holders[2], index, &key, 20).unwrap(),
        ReportOutcome::Resolved {
            status: FlightStatus::LateAirline,
            credited: 1
        }
    );
    // Late reports change nothing
    assert!(matches!(
        engine.submit_oracle_response(&holders[3], index, &key, 10).unwrap(),
        ReportOutcome::Ignored(_)
    ));

    assert_eq!(engine.get_flight_status(&key).unwrap(), FlightStatus::LateAirline);
    let info = engine.get_insurance_info(&key, &passenger()).unwrap();
    assert!(info.credited);
    assert_eq!(info.payout.value(), dec!(1.5));
    assert_eq!(engine.credit_balance(&passenger()).value(), dec!(1.5));

    assert_eq!(engine.withdraw(&passenger()).unwrap().value(), dec!(1.5));
    assert_eq!(engine.withdraw(&passenger()).unwrap(), Amount::ZERO);
    assert_eq!(engine.credit_balance(&passenger()), Amount::ZERO);

    // Insurance closes once the flight resolves
    let err = engine
        .buy_insurance(&Principal::new("PASSENGER_2"), &key, Amount::from_units(1))
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_MATCHABLE");

    assert!(engine.verify_integrity());
    assert_eq!(engine.metrics().withdrawals, 1);
    assert_eq!(engine.metrics().flights_resolved, 1);
}

#[test]
fn test_weather_delay_pays_nothing() {
    let engine = with_founders();
    let key = flight_of(1);

    assert_ok!(engine.register_flight(&airline(1), &key));
    assert_ok!(engine.buy_insurance(&passenger(), &key, Amount::from_str("0.4").unwrap()));

    let index = engine.fetch_flight_status(&passenger(), &key).unwrap();
    for holder in oracles_holding(&engine, index, 3) {
        engine.submit_oracle_response(&holder, index, &key, 30).unwrap();
    }

    assert_eq!(engine.get_flight_status(&key).unwrap(), FlightStatus::LateWeather);
    assert!(!engine.get_insurance_info(&key, &passenger()).unwrap().credited);
    assert_eq!(engine.credit_balance(&passenger()), Amount::ZERO);
    assert_eq!(engine.withdraw(&passenger()).unwrap(), Amount::ZERO);
}

#[test]
fn test_paused_engine_rejects_mutations() {
    let engine = with_founders();
    let key = flight_of(1);
    assert_ok!(engine.register_flight(&airline(1), &key));

    engine.set_operating_status(&owner(), false).unwrap();

    let results = [
        engine.register_airline(&airline(1), &airline(5)).err(),
        engine.fund_airline(&airline(1), Amount::from_units(1)).err(),
        engine.register_flight(&airline(1), &flight_of(2)).err(),
        engine.buy_insurance(&passenger(), &key, Amount::from_units(1)).err(),
        engine.fetch_flight_status(&passenger(), &key).err(),
        engine.register_oracle(&oracle(1), Amount::from_units(1)).err(),
        engine.submit_oracle_response(&oracle(1), 0, &key, 20).err(),
        engine.withdraw(&passenger()).err(),
    ];
    for result in results {
        assert_eq!(result, Some(FlightSuretyError::NotOperational));
    }

    // Queries still answer
    assert!(!engine.is_operational());
    assert!(engine.is_airline_available(&airline(1)));
    assert!(engine.is_flight_registered(&key));
    assert_eq!(engine.get_flight_status(&key).unwrap(), FlightStatus::Unknown);
    assert_eq!(engine.credit_balance(&passenger()), Amount::ZERO);

    engine.set_operating_status(&owner(), true).unwrap();
    assert_ok!(engine.buy_insurance(&passenger(), &key, Amount::from_units(1)));
}

#[tokio::test]
async fn test_oracle_request_reaches_subscribers() {
    let engine = with_fifth_airline();
    let key = flight_of(5);
    assert_ok!(engine.register_flight(&airline(5), &key));

    let mut events = engine.subscribe();
    let index = engine.fetch_flight_status(&passenger(), &key).unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(
        event,
        Event::OracleRequest {
            index,
            flight: key.clone()
        }
    );

    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "ORACLE_REQUEST");
    assert_eq!(json["index"], index);
}
