pub const PATH_THRESHOLDS_BY_ROOM: &str = "/api/climate-thresholds/room";
pub const PATH_SENSORS: &str = "/api/sensors";
pub const PATH_READINGS_PROCESS_SUFFIX: &str = "/readings/process";

pub const CONTENT_TYPE_JSON: &str = "application/json";

pub fn thresholds_url(base_url: &str, room_id: u32) -> String {
    format!(
        "{}{PATH_THRESHOLDS_BY_ROOM}/{room_id}",
        base_url.trim_end_matches('/')
    )
}

pub fn readings_process_url(base_url: &str, sensor_id: u32) -> String {
    format!(
        "{}{PATH_SENSORS}/{sensor_id}{PATH_READINGS_PROCESS_SUFFIX}",
        base_url.trim_end_matches('/')
    )
}
