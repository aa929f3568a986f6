//! Road network files: whitespace-separated nodes and links.
//!
//! Unlike the train files these carry a free-text title on line 1 and put
//! their header on line 2. Columns are separated by any run of spaces or
//! tabs, and the trailing description may itself contain spaces (everything
//! after the last numeric column is joined back together).
//!
//! Node file:
//!
//! ```text
//! <title>
//! N scaleX scaleY
//! nodeId x y nodeType macroZoneCluster informationAvailability [description...]
//! ```
//!
//! Link file:
//!
//! ```text
//! <title>
//! N lengthScale speedScale satFlowScale jamDensityScale tollScale
//! userId fromId toId length numLanes freeSpeed saturationFlow maxSpeed
//!     speedAtCapacity jamDensity minSpeed capacity linkType grade signalId
//!     leftTurnBays rightTurnBays costFactor toll mode [description...]
//! ```

use std::path::Path;

use tracing::{debug, info};

use crate::network::records::{RoadLink, RoadNode};
use crate::{Error, Result};
use super::{parse_header, sanitize};

// ============================================================================
// Nodes
// ============================================================================

fn parse_node_row(t: &[&str], scale_x: f64, scale_y: f64) -> Option<RoadNode> {
    if t.len() < 6 {
        return None;
    }
    Some(RoadNode {
        node_id: t[0].parse().ok()?,
        x: t[1].parse::<f64>().ok()? * scale_x,
        y: t[2].parse::<f64>().ok()? * scale_y,
        node_type: t[3].parse().ok()?,
        macro_zone_cluster: t[4].parse().ok()?,
        information_availability: t[5].parse().ok()?,
        description: t[6..].join(" "),
    })
}

pub fn parse_node_file(text: &str) -> Result<Vec<RoadNode>> {
    let text = sanitize(text);
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return Err(Error::Parse {
            line: lines.len() + 1,
            message: "road node file needs a title line and a header line".into(),
        });
    }
    let head: Vec<&str> = lines[1].split_whitespace().collect();
    if head.len() < 3 {
        return Err(Error::Parse {
            line: 2,
            message: format!("node header needs count and two scales, found {} fields", head.len()),
        });
    }
    let scale_x: f64 = parse_header(head[1], 2, "x scale")?;
    let scale_y: f64 = parse_header(head[2], 2, "y scale")?;

    let mut nodes = Vec::new();
    for (idx, line) in lines.iter().enumerate().skip(2) {
        if line.trim().is_empty() {
            continue;
        }
        let t: Vec<&str> = line.split_whitespace().collect();
        match parse_node_row(&t, scale_x, scale_y) {
            Some(node) => nodes.push(node),
            None => debug!(line = idx + 1, "skipping malformed road node row"),
        }
    }
    Ok(nodes)
}

pub fn read_node_file(path: &Path) -> Result<Vec<RoadNode>> {
    let text = std::fs::read_to_string(path)?;
    let nodes = parse_node_file(&text)?;
    info!(path = %path.display(), count = nodes.len(), "read road node file");
    Ok(nodes)
}

// ============================================================================
// Links
// ============================================================================

struct LinkScales {
    length: f64,
    speed: f64,
    saturation_flow: f64,
    jam_density: f64,
    toll: f64,
}

fn parse_link_row(t: &[&str], s: &LinkScales) -> Option<RoadLink> {
    if t.len() < 20 {
        return None;
    }
    Some(RoadLink {
        user_id: t[0].parse().ok()?,
        from_id: t[1].parse().ok()?,
        to_id: t[2].parse().ok()?,
        length: t[3].parse::<f64>().ok()? * s.length,
        num_lanes: t[4].parse().ok()?,
        free_speed: t[5].parse::<f64>().ok()? * s.speed,
        saturation_flow: t[6].parse::<f64>().ok()? * s.saturation_flow,
        max_speed: t[7].parse::<f64>().ok()? * s.speed,
        speed_at_capacity: t[8].parse::<f64>().ok()? * s.speed,
        jam_density: t[9].parse::<f64>().ok()? * s.jam_density,
        min_speed: t[10].parse::<f64>().ok()? * s.speed,
        capacity: t[11].parse().ok()?,
        link_type: t[12].parse().ok()?,
        grade: t[13].parse().ok()?,
        signal_id: t[14].parse().ok()?,
        left_turn_bays: t[15].parse().ok()?,
        right_turn_bays: t[16].parse().ok()?,
        cost_factor: t[17].parse().ok()?,
        toll: t[18].parse::<f64>().ok()? * s.toll,
        mode: t[19].parse().ok()?,
        description: t[20..].join(" "),
    })
}

pub fn parse_link_file(text: &str) -> Result<Vec<RoadLink>> {
    let text = sanitize(text);
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return Err(Error::Parse {
            line: lines.len() + 1,
            message: "road link file needs a title line and a header line".into(),
        });
    }
    let head: Vec<&str> = lines[1].split_whitespace().collect();
    if head.len() < 6 {
        return Err(Error::Parse {
            line: 2,
            message: format!("link header needs count and five scales, found {} fields", head.len()),
        });
    }
    let scales = LinkScales {
        length: parse_header(head[1], 2, "length scale")?,
        speed: parse_header(head[2], 2, "speed scale")?,
        saturation_flow: parse_header(head[3], 2, "saturation flow scale")?,
        jam_density: parse_header(head[4], 2, "jam density scale")?,
        toll: parse_header(head[5], 2, "toll scale")?,
    };

    let mut links = Vec::new();
    for (idx, line) in lines.iter().enumerate().skip(2) {
        if line.trim().is_empty() {
            continue;
        }
        let t: Vec<&str> = line.split_whitespace().collect();
        match parse_link_row(&t, &scales) {
            Some(link) => links.push(link),
            None => debug!(line = idx + 1, "skipping malformed road link row"),
        }
    }
    Ok(links)
}

pub fn read_link_file(path: &Path) -> Result<Vec<RoadLink>> {
    let text = std::fs::read_to_string(path)?;
    let links = parse_link_file(&text)?;
    info!(path = %path.display(), count = links.len(), "read road link file");
    Ok(links)
}

// ============================================================================
// Tests
// ============================================================================
