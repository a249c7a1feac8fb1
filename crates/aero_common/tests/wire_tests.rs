//! Decoding of backend payloads as emitted by the different backend revisions.

use aero_common::{
    ActionType, DataSnapshot, FlightStatus, HealResponse, OptionId, OvertimeQuote,
    ResolutionOption, StatusReport, SystemStatus,
};
use serde_json::json;

#[test]
fn test_legacy_data_snapshot() {
    let body = json!({
        "pilot_readiness": [
            {
                "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
                "Pilot_ID": "P-204",
                "Pilot_Name": "Capt. R. Mehta",
                "Fatigue_Risk_Score": 81.1,
                "Pilot_Status": "AVAILABLE"
            }
        ],
        "flights": [
            {
                "Flight_ID": "FLY1001",
                "Origin": "DEL",
                "Destination": "BOM",
                "Route": "DEL to BOM",
                "Departure_Time": "2025-12-31 03:00",
                "Departure": "2025-12-31T03:00:00",
                "Pilot_ID": "P-204",
                "Name": "Capt. R. Mehta",
                "Fatigue_Score": 40,
                "Sys_Status": "DELAYED",
                "Delay_Minutes": 45,
                "Disruption_Type": "WEATHER"
            }
        ],
        "agent_logs": ["LOG: Crisis injected"],
        "total_flights": 120
    });

    let snapshot: DataSnapshot = serde_json::from_value(body).unwrap();
    assert_eq!(snapshot.total_flights, 120);

    let flight = &snapshot.flights[0];
    assert_eq!(flight.flight_number, "FLY1001");
    assert_eq!(flight.status, FlightStatus::Delayed);
    assert_eq!(flight.effective_delay(), Some(45));
    assert_eq!(flight.assigned_pilot.as_deref(), Some("P-204"));
    assert_eq!(flight.pilot_name.as_deref(), Some("Capt. R. Mehta"));
    assert!(flight.departure_at().is_some());
    assert!(flight.is_consistent());

    let pilot = &snapshot.pilot_readiness[0];
    assert_eq!(pilot.identifier(), "P-204");
    assert!(pilot.is_high_risk());
}

#[test]
fn test_current_data_snapshot() {
    let body = json!({
        "pilot_readiness": [
            {
                "_id": "P-9",
                "name": "F/O Lin",
                "base": "BLR",
                "fatigue_score": 0.35,
                "currentDutyMinutes": 210,
                "weekly_flight_minutes": 2520,
                "overtime_rate_per_hour": 85.0
            }
        ],
        "flights": [
            {
                "_id": "6E-121",
                "origin": "BLR",
                "destination": "MAA",
                "departure": "2025-12-31T09:30:00.000Z",
                "assigned_pilot": null,
                "status": "UNASSIGNED",
                "landings": 1,
                "is_night_duty": false
            }
        ],
        "agent_logs": [],
        "total_flights": 1
    });

    let snapshot: DataSnapshot = serde_json::from_value(body).unwrap();
    let flight = &snapshot.flights[0];
    assert_eq!(flight.reference(), "6E-121");
    assert!(flight.is_unassigned());
    assert!(flight.is_consistent());

    let pilot = &snapshot.pilot_readiness[0];
    assert_eq!(pilot.display_name(), "F/O Lin");
    assert!(!pilot.is_high_risk());
    assert!(pilot.is_overtime());
    assert_eq!(pilot.remaining_weekly_minutes(), 0.0);
}

#[test]
fn test_empty_data_body() {
    let snapshot: DataSnapshot = serde_json::from_value(json!({})).unwrap();
    assert!(snapshot.flights.is_empty());
    assert_eq!(snapshot.total_flights, 0);
}

#[test]
fn test_status_with_details() {
    let report: StatusReport =
        serde_json::from_value(json!({"status": "INFEASIBLE", "details": "3 Critical Events"}))
            .unwrap();
    assert_eq!(report.status, SystemStatus::Infeasible);
    assert!(!report.status.is_nominal());
    assert_eq!(report.details.as_deref(), Some("3 Critical Events"));
}

#[test]
fn test_manual_heal_with_agent_nodes() {
    let body = json!({
        "status": "OPTIONS_GENERATED",
        "options": [
            {
                "id": "OPT_1",
                "title": "Assign P-204",
                "description": "Fatigue Risk: 12%. Immediate Availability.",
                "action_type": "ASSIGN",
                "payload": {"flight_id": "FLY1001", "pilot_id": "P-204"}
            },
            {
                "id": "OPT_3",
                "title": "Cancel Flight FLY1001",
                "action_type": "CANCEL",
                "payload": {"flight_id": "FLY1001"}
            }
        ],
        "agent_nodes": [
            {"id": "detect", "label": "Anomaly Detected", "status": "active"},
            {"id": "resolve", "label": "Awaiting Approval", "status": "pending"}
        ]
    });

    let response: HealResponse = serde_json::from_value(body).unwrap();
    let options = response.options.as_ref().unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].id, OptionId::Text("OPT_1".into()));
    assert_eq!(options[1].action_type, ActionType::Cancel);
    assert_eq!(response.agent_nodes.as_ref().unwrap().len(), 2);
    assert!(response.recommendation().is_none());
}

#[test]
fn test_recommendation_heal_with_sustainability() {
    let body = json!({
        "status": "OPTIONS_GENERATED",
        "options": [
            {"id": 1, "action_type": "SWAP_FLIGHT", "payload": {"flight_id": "F1", "target_flight_id": "F2"}},
            {"id": 2, "action_type": "DELAY_MANUAL", "payload": {"flight_id": "F1"}}
        ],
        "recommended_strategy": {"id": 1, "action_type": "SWAP_FLIGHT", "payload": {"flight_id": "F1", "target_flight_id": "F2"}},
        "reasoning_trace": ["F2 crew rested", "swap keeps both slots"],
        "sustainability_impact": {"fuel_saved_kg": 420.5, "co2_saved_kg": 1325}
    });

    let response: HealResponse = serde_json::from_value(body).unwrap();
    let packet = response.recommendation().unwrap();
    assert_eq!(packet.recommended_strategy.id, OptionId::Int(1));
    assert_eq!(packet.reasoning_trace[0], "F2 crew rested");

    let impact = packet.sustainability_impact.unwrap();
    assert_eq!(impact.metric("fuel_saved_kg"), Some(420.5));
    assert_eq!(impact.metric("co2_saved_kg"), Some(1325.0));
}

#[test]
fn test_unknown_action_type_survives() {
    let raw = json!({"id": "X", "action_type": "REROUTE", "payload": {"via": "HYD"}});
    let option: ResolutionOption = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(option.action_type, ActionType::Other("REROUTE".into()));
    assert!(option.is_directly_resolvable());
    assert_eq!(serde_json::to_value(&option).unwrap(), raw);
}

#[test]
fn test_option_without_payload_defaults_to_empty() {
    let option: ResolutionOption =
        serde_json::from_value(json!({"id": 3, "action_type": "CANCEL"})).unwrap();
    assert!(option.payload().is_none());
    assert_eq!(option.target_flight(), None);
    assert_eq!(option.label(), "CANCEL #3");
    assert_eq!(
        serde_json::to_value(&option).unwrap(),
        json!({"id": 3, "action_type": "CANCEL"})
    );
}

#[test]
fn test_null_payload_decodes_and_round_trips() {
    let body = json!({
        "status": "OPTIONS_GENERATED",
        "options": [{"id": 1, "action_type": "CANCEL", "payload": null}]
    });
    let response: HealResponse = serde_json::from_value(body).unwrap();
    let options = response.options.unwrap();
    assert_eq!(options.len(), 1);
    assert!(options[0].payload().is_none());
    assert_eq!(
        serde_json::to_value(&options[0]).unwrap(),
        json!({"id": 1, "action_type": "CANCEL", "payload": null})
    );
}

#[test]
fn test_null_title_and_description_round_trip() {
    let raw = json!({
        "id": 1,
        "title": null,
        "description": null,
        "action_type": "ASSIGN",
        "payload": {"flight_id": "F1"}
    });
    let option: ResolutionOption = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(option.description(), None);
    assert_eq!(option.target_flight(), Some("F1"));
    assert_eq!(serde_json::to_value(&option).unwrap(), raw);
}

#[test]
fn test_overtime_quote() {
    let body = json!({
        "cost": 340.0,
        "breakdown": [
            {"category": "Base overtime", "amount": 255.0},
            {"category": "Night premium", "amount": 85.0}
        ],
        "projected_fatigue": 0.74,
        "is_overtime": true,
        "compliance": {"rest_48h": "OK", "night_flights": 2, "recent_duty": "WARN"}
    });

    let quote: OvertimeQuote = serde_json::from_value(body).unwrap();
    assert_eq!(quote.breakdown.len(), 2);
    assert!(quote.is_overtime);
    let compliance = quote.compliance.unwrap();
    assert_eq!(compliance.night_flights, Some(json!(2)));
}
