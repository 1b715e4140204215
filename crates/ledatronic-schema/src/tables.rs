//! Lookup tables and the field layout of the LEDATRONIC status payload.

use crate::field::{ByteOrder, FieldDef, FieldKind, ValueMap};

/// Oven state codes.
pub const OVEN_STATES: &[(u8, &str)] = &[
    (0, "Bereit"),
    (1, "Start"),
    (2, "Anheizen"),
    (3, "Anheizen"),
    (4, "Heizbetrieb"),
    (5, "Ende"),
    (6, "Pause"),
    (7, "Grundglut"),
    (8, "Grundglut nachlegen"),
    (97, "Anheizfehler"),
    (98, "Tür offen"),
    (99, "Sensorfehler"),
];

/// Fan state codes.
pub const VENT_STATES: &[(u8, &str)] = &[(0, "off"), (1, "on")];

pub(crate) fn ledatronic_fields() -> Vec<FieldDef> {
    use ByteOrder::{Big, Little};

    let oven_states = ValueMap::from_pairs(OVEN_STATES);
    let vent_states = ValueMap::from_pairs(VENT_STATES);

    vec![
        FieldDef::int("current_combustion_temp", 0, 2, Big)
            .with_label("Brennraumtemperatur")
            .with_unit("°C"),
        FieldDef::int("air_flap_setpoint", 2, 1, Little)
            .with_label("Luftklappe Soll")
            .with_unit("%"),
        FieldDef::int("air_flap_actual", 3, 1, Little)
            .with_label("Luftklappe Ist")
            .with_unit("%"),
        FieldDef::mapped("status", 4, &oven_states).with_label("Status"),
        FieldDef::int("error_status", 5, 1, Little).with_label("Fehlerstatus"),
        FieldDef::int("output", 6, 1, Little).with_label("Ausgabe"),
        FieldDef::int("controller_version", 7, 1, Little).with_label("Reglerversion"),
        FieldDef::int("max_combustion_temp", 8, 2, Big)
            .with_label("maximale Brennraumtemperatur")
            .with_unit("°C"),
        FieldDef::int("oven_state_raw", 10, 1, Little).with_label("oven (raw value)"),
        FieldDef::mapped("oven_state_mapped", 10, &oven_states).with_label("oven (mapped state)"),
        FieldDef::int("base_glow_temp", 11, 1, Little)
            .with_label("Grundgluttemperatur, berechnet")
            .with_unit("°C"),
        FieldDef::int("trend", 12, 1, Little).with_label("Abbrandkurventrend"),
        FieldDef::int("num_burn_cycles", 25, 2, Big).with_label("Anzahl Abbrände"),
        FieldDef::int("num_heating_errors", 27, 2, Big)
            .with_label("Anzahl Heizfehler (offset 15)"),
        FieldDef::int("water_pocket_temp", 31, 1, Little)
            .with_label("WassertascheTemp in °C")
            .with_unit("°C"),
        FieldDef::int("tank_temp_bottom", 34, 1, Little)
            .with_label("TankTempUnten in °C")
            .with_unit("°C"),
        FieldDef::int("tank_temp_middle", 35, 1, Little)
            .with_label("TankTempMitte - Fix: 141°C no sensor")
            .with_unit("°C"),
        FieldDef::int("tank_temp_top", 36, 1, Little)
            .with_label("TankTempOben")
            .with_unit("°C"),
        FieldDef::int("forward_temp", 37, 1, Little)
            .with_label("Rücklauftemperatur")
            .with_unit("°C"),
        FieldDef::int("pump_power", 38, 1, Little)
            .with_label("Pumpleistung")
            .with_unit("%"),
        FieldDef::int("supply_temp", 39, 1, Little)
            .with_label("Vorlauftemperatur")
            .with_unit("°C"),
        FieldDef::int("pressure", 44, 1, Little).with_label("Druck"),
        FieldDef::int("exhaust_temp", 46, 2, Big)
            .with_label("Abgastemperatur")
            .with_unit("°C"),
        // Shares offset 50 with error_pressure.
        FieldDef::mapped("fan_state", 50, &vent_states).with_label("Ventilator"),
        FieldDef::new("lock_state", 47, 1, FieldKind::Bool).with_label("Sperre"),
        FieldDef::int("alarm_counter", 48, 1, Little).with_label("Alarmzähler"),
        FieldDef::int("error_offset", 49, 1, Little).with_label("Erroroffset"),
        FieldDef::int("error_pressure", 50, 1, Little).with_label("ErrorPressure"),
    ]
}
