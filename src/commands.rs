use serde_json::{json, Value};

/// Static description of one named vehicle command: the endpoint suffix
/// under the vehicle's API path and the default request body.
#[derive(Debug)]
pub struct CommandDescriptor {
    pub path: &'static str,
    pub default_body: Value,
}

fn descriptor(path: &'static str) -> CommandDescriptor {
    CommandDescriptor {
        path,
        default_body: json!({}),
    }
}

fn descriptor_with(path: &'static str, default_body: Value) -> CommandDescriptor {
    CommandDescriptor { path, default_body }
}

/// Look up a command by its route name. Unknown names mean the route does
/// not exist.
pub fn lookup(name: &str) -> Option<CommandDescriptor> {
    let descriptor = match name {
        "cancelAlert" => descriptor("commands/cancelAlert"),
        "alert" => descriptor("commands/alert"),
        "lockDoor" => descriptor_with("commands/lockDoor", json!({"delay": 0})),
        "unlockDoor" => descriptor_with("commands/unlockDoor", json!({"delay": 0})),
        "lockTrunk" => descriptor_with("commands/lockTrunk", json!({"delay": 0})),
        "unlockTrunk" => descriptor_with("commands/unlockTrunk", json!({"delay": 0})),
        "start" => descriptor_with(
            "commands/start",
            json!({"cabinTemperature": false, "delay": 0}),
        ),
        "cancelStart" => descriptor("commands/cancelStart"),
        "location" => descriptor("commands/location"),
        "sendTBTRoute" => descriptor("commands/sendTBTRoute"),
        "diagnostics" => descriptor_with(
            "commands/diagnostics",
            json!({
                "diagnosticsRequest": {
                    "diagnosticItem": [
                        "TARGET CHARGE LEVEL SETTINGS",
                        "LAST TRIP FUEL ECONOMY",
                        "PREF CHARGING TIMES SETTING",
                        "ENERGY EFFICIENCY",
                        "LIFETIME ENERGY USED",
                        "ESTIMATED CABIN TEMPERATURE",
                        "EV BATTERY LEVEL",
                        "HV BATTERY CHARGE COMPLETE TIME",
                        "HIGH VOLTAGE BATTERY PRECONDITIONING STATUS",
                        "EV PLUG VOLTAGE",
                        "HOTSPOT CONFIG",
                        "ODOMETER",
                        "HOTSPOT STATUS",
                        "LIFETIME EV ODOMETER",
                        "CHARGER POWER LEVEL",
                        "CABIN PRECONDITIONING TEMP CUSTOM SETTING",
                        "EV PLUG STATE",
                        "EV CHARGE STATE",
                        "TIRE PRESSURE",
                        "LOCATION BASE CHARGE SETTING",
                        "LAST TRIP DISTANCE",
                        "CABIN PRECONDITIONING REQUEST",
                        "GET COMMUTE SCHEDULE",
                        "GET CHARGE MODE",
                        "PREF CHARGING TIMES PLAN",
                        "VEHICLE RANGE",
                        "HYBRID BATTERY MINIMUM TEMPERATURE",
                        "EV ESTIMATED CHARGE END",
                        "AMBIENT AIR TEMPERATURE",
                        "INTERM VOLT BATT VOLT",
                        "EV SCHEDULED CHARGE START",
                        "ENGINE COOLANT TEMP",
                        "ENGINE RPM",
                        "OIL LIFE",
                        "LIFETIME FUEL ECON",
                        "FUEL TANK INFO",
                        "ENGINE AIR FILTER MONITOR STATUS",
                        "LIFETIME FUEL USED"
                    ]
                }
            }),
        ),
        "chargeOverride" => descriptor("commands/chargeOverride"),
        "getChargingProfile" => descriptor("commands/getChargingProfile"),
        "setChargingProfile" => descriptor_with(
            "commands/setChargingProfile",
            json!({"chargeMode": "DEFAULT_IMMEDIATE", "rateType": "OFFPEAK"}),
        ),
        "getCommuteSchedule" => descriptor("commands/getCommuteSchedule"),
        "setCommuteSchedule" => descriptor("commands/setCommuteSchedule"),
        "stopCharge" => descriptor("commands/stopCharge"),
        "stopFastCharge" => descriptor("commands/stopFastCharge"),
        "createTripPlan" => descriptor("commands/createTripPlan"),
        "getTripPlan" => descriptor("commands/getTripPlan"),
        "setHvacSettings" => descriptor("commands/setHvacSettings"),
        "getChargerPowerLevel" => descriptor("commands/getChargerPowerLevel"),
        "setChargerPowerLevel" => descriptor("commands/setChargerPowerLevel"),
        "getRateSchedule" => descriptor("commands/getRateSchedule"),
        "setRateSchedule" => descriptor("commands/setRateSchedule"),
        "setPriorityCharging" => descriptor("commands/setPriorityCharging"),
        "getPriorityCharging" => descriptor("commands/getPriorityCharging"),
        "startTrailerLightSeq" => descriptor("commands/startTrailerLightSeq"),
        "stopTrailerLightSeq" => descriptor("commands/stopTrailerLightSeq"),
        "getHotspotInfo" => descriptor("hotspot/commands/getInfo"),
        "setHotspotInfo" => descriptor("hotspot/commands/setInfo"),
        "getHotspotStatus" => descriptor("hotspot/commands/getStatus"),
        "enableHotspot" => descriptor("hotspot/commands/enable"),
        "disableHotspot" => descriptor("hotspot/commands/disable"),
        _ => return None,
    };
    Some(descriptor)
}
