//! Vendor record types.
//!
//! These mirror the rows of the vendor text files one to one, with scales
//! already applied by the parsers. Facades keep the full records and project
//! a routing subset onto their graphs, so nothing from the files is lost
//! even when routing never looks at it.

use serde::{Deserialize, Serialize};

// ============================================================================
// Train records
// ============================================================================

/// One row of a train node file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainNode {
    pub user_id: i64,
    pub x: f64,
    pub y: f64,
    /// Station or terminal rather than a plain junction.
    pub is_terminal: bool,
    /// Dwell time at the stop, seconds.
    pub dwell_time: f64,
    /// Free-text label; "ND" when the file left it blank.
    pub description: String,
}

/// One row of a train link file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainLink {
    pub user_id: i64,
    pub from_id: i64,
    pub to_id: i64,
    pub length: f64,
    pub max_speed: f64,
    pub signal_no: i64,
    pub grade: f64,
    pub curvature: f64,
    /// 2 means the link is traversable both ways.
    pub num_directions: i32,
    pub speed_variation: f64,
    pub has_catenary: bool,
    pub signals_at_nodes: String,
    /// Region label; "ND Region" when the file left it blank.
    pub region: String,
}

impl TrainLink {
    pub fn is_bidirectional(&self) -> bool {
        self.num_directions == 2
    }
}

// ============================================================================
// Road records
// ============================================================================

/// One row of a road node file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoadNode {
    pub node_id: i64,
    pub x: f64,
    pub y: f64,
    pub node_type: i32,
    pub macro_zone_cluster: i32,
    pub information_availability: i32,
    pub description: String,
}

/// One row of a road link file.
///
/// Several fields (speed at capacity, jam density, ...) are carried for
/// completeness of the record even though routing only consumes the subset
/// projected onto edge attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoadLink {
    pub user_id: i64,
    pub from_id: i64,
    pub to_id: i64,
    pub length: f64,
    pub num_lanes: i32,
    pub free_speed: f64,
    /// Per-lane saturation flow, vehicles/hour.
    pub saturation_flow: f64,
    pub max_speed: f64,
    pub speed_at_capacity: f64,
    pub jam_density: f64,
    pub min_speed: f64,
    pub capacity: f64,
    pub link_type: i32,
    pub grade: f64,
    pub signal_id: i64,
    pub left_turn_bays: i32,
    pub right_turn_bays: i32,
    /// Multiplier for cost-based path metrics.
    pub cost_factor: f64,
    pub toll: f64,
    /// Allowed transport mode code.
    pub mode: i32,
    pub description: String,
}

// ============================================================================
// Simulation configuration
// ============================================================================

/// Input file names, relative to the input folder.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputFiles {
    pub node_coordinates: String,
    pub link_structure: String,
    pub signal_timing: String,
    pub traffic_demands: String,
    pub incident_descriptions: String,
}

/// Output file names, relative to the output folder.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputFiles {
    pub standard_output: String,
    pub link_flow_microscopic: String,
    pub link_flow_minimum_tree: String,
    pub minimum_path_tree_routing: String,
    pub trip_based_vehicle_probe: String,
    pub second_by_second_vehicle_probe: String,
    pub link_travel_time: String,
    pub minimum_path_tree_output_1: String,
    pub minimum_path_tree_output_2: String,
    pub vehicle_departures: String,
    pub individual_vehicle_path: String,
    pub emission_concentration: String,
    pub summary_output: String,
    pub link_flow_mesoscopic: String,
    pub time_space_output: String,
}

/// Parsed simulation configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub title: String,
    /// Total simulated time, minutes.
    pub sim_time: f64,
    pub output_freq_10: i64,
    pub output_freq_12_14: i64,
    pub routing_option: i32,
    pub pause_flag: bool,
    /// "." when the file left the folder line blank.
    pub input_folder: String,
    pub output_folder: String,
    pub inputs: InputFiles,
    pub outputs: OutputFiles,
}
