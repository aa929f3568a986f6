//! Simulation configuration file: a fixed 24-line layout.
//!
//! ```text
//! line 1      title
//! line 2      simTime outputFreq10 outputFreq12_14 routingOption pauseFlag
//! line 3      input folder  ("." when blank)
//! line 4      output folder ("." when blank)
//! lines 5-9   input file names
//! lines 10-24 output file names
//! ```
//!
//! Every line is positional, so blank lines count; a file shorter than 24
//! lines is rejected outright.

use std::path::Path;

use tracing::info;

use crate::network::records::{InputFiles, OutputFiles, SimulationConfig};
use crate::{Error, Result};
use super::{parse_header, sanitize};

pub fn parse_config(text: &str) -> Result<SimulationConfig> {
    let text = sanitize(text);
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    if lines.len() < 24 {
        return Err(Error::Parse {
            line: lines.len() + 1,
            message: format!("config file needs 24 lines, found {}", lines.len()),
        });
    }

    let params: Vec<&str> = lines[1].split_whitespace().collect();
    if params.len() < 5 {
        return Err(Error::Parse {
            line: 2,
            message: format!("expected 5 simulation parameters, found {}", params.len()),
        });
    }
    let sim_time: f64 = parse_header(params[0], 2, "simulation time")?;
    let output_freq_10: i64 = parse_header(params[1], 2, "output frequency (file 10)")?;
    let output_freq_12_14: i64 = parse_header(params[2], 2, "output frequency (files 12-14)")?;
    let routing_option: i32 = parse_header(params[3], 2, "routing option")?;
    let pause_flag: i32 = parse_header(params[4], 2, "pause flag")?;

    let folder = |s: &str| if s.is_empty() { ".".to_owned() } else { s.to_owned() };

    Ok(SimulationConfig {
        title: lines[0].to_owned(),
        sim_time,
        output_freq_10,
        output_freq_12_14,
        routing_option,
        pause_flag: pause_flag != 0,
        input_folder: folder(lines[2]),
        output_folder: folder(lines[3]),
        inputs: InputFiles {
            node_coordinates: lines[4].to_owned(),
            link_structure: lines[5].to_owned(),
            signal_timing: lines[6].to_owned(),
            traffic_demands: lines[7].to_owned(),
            incident_descriptions: lines[8].to_owned(),
        },
        outputs: OutputFiles {
            standard_output: lines[9].to_owned(),
            link_flow_microscopic: lines[10].to_owned(),
            link_flow_minimum_tree: lines[11].to_owned(),
            minimum_path_tree_routing: lines[12].to_owned(),
            trip_based_vehicle_probe: lines[13].to_owned(),
            second_by_second_vehicle_probe: lines[14].to_owned(),
            link_travel_time: lines[15].to_owned(),
            minimum_path_tree_output_1: lines[16].to_owned(),
            minimum_path_tree_output_2: lines[17].to_owned(),
            vehicle_departures: lines[18].to_owned(),
            individual_vehicle_path: lines[19].to_owned(),
            emission_concentration: lines[20].to_owned(),
            summary_output: lines[21].to_owned(),
            link_flow_mesoscopic: lines[22].to_owned(),
            time_space_output: lines[23].to_owned(),
        },
    })
}

pub fn read_config_file(path: &Path) -> Result<SimulationConfig> {
    let text = std::fs::read_to_string(path)?;
    let config = parse_config(&text)?;
    info!(path = %path.display(), title = %config.title, "read simulation config");
    Ok(config)
}
