//! Train network files: tab-separated nodes and links.
//!
//! Node file layout (tabs between columns):
//!
//! ```text
//! N  scaleX  scaleY
//! userId  x  y  isTerminal  dwellTime  [description]
//! ...
//! ```
//!
//! Link file layout:
//!
//! ```text
//! N  lengthScale  speedScale
//! userId fromId toId length maxSpeed signalNo grade curvature
//!     numDirections speedVariation hasCatenary [signalsAtNodes] [region]
//! ...
//! ```
//!
//! The leading count `N` is not trusted; rows are read to end of file. The
//! coordinate and unit scales from the header are applied to every row.

use std::path::Path;

use tracing::{debug, info};

use crate::network::records::{TrainLink, TrainNode};
use crate::{Error, Result};
use super::{parse_header, sanitize, truthy};

/// Optional trailing field with a vendor placeholder default.
fn field_or(t: &[&str], i: usize, default: &str) -> String {
    t.get(i)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| default.to_owned())
}

// ============================================================================
// Nodes
// ============================================================================

fn parse_node_row(t: &[&str], scale_x: f64, scale_y: f64) -> Option<TrainNode> {
    if t.len() < 5 {
        return None;
    }
    Some(TrainNode {
        user_id: t[0].parse().ok()?,
        x: t[1].parse::<f64>().ok()? * scale_x,
        y: t[2].parse::<f64>().ok()? * scale_y,
        is_terminal: truthy(t[3]),
        dwell_time: t[4].parse().ok()?,
        description: field_or(t, 5, "ND"),
    })
}

pub fn parse_node_file(text: &str) -> Result<Vec<TrainNode>> {
    let text = sanitize(text);
    let mut lines = text.lines().enumerate();
    let Some((header_idx, header)) = lines.by_ref().find(|(_, l)| !l.trim().is_empty()) else {
        return Err(Error::Parse { line: 1, message: "empty train node file".into() });
    };
    let header_line = header_idx + 1;
    let head: Vec<&str> = header.split('\t').map(str::trim).collect();
    if head.len() < 3 {
        return Err(Error::Parse {
            line: header_line,
            message: format!("node header needs count and two scales, found {} fields", head.len()),
        });
    }
    let scale_x: f64 = parse_header(head[1], header_line, "x scale")?;
    let scale_y: f64 = parse_header(head[2], header_line, "y scale")?;

    let mut nodes = Vec::new();
    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let t: Vec<&str> = line.split('\t').map(str::trim).collect();
        match parse_node_row(&t, scale_x, scale_y) {
            Some(node) => nodes.push(node),
            None => debug!(line = idx + 1, "skipping malformed train node row"),
        }
    }
    Ok(nodes)
}

pub fn read_node_file(path: &Path) -> Result<Vec<TrainNode>> {
    let text = std::fs::read_to_string(path)?;
    let nodes = parse_node_file(&text)?;
    info!(path = %path.display(), count = nodes.len(), "read train node file");
    Ok(nodes)
}

// ============================================================================
// Links
// ============================================================================

fn parse_link_row(t: &[&str], length_scale: f64, speed_scale: f64) -> Option<TrainLink> {
    if t.len() < 11 {
        return None;
    }
    Some(TrainLink {
        user_id: t[0].parse().ok()?,
        from_id: t[1].parse().ok()?,
        to_id: t[2].parse().ok()?,
        length: t[3].parse::<f64>().ok()? * length_scale,
        max_speed: t[4].parse::<f64>().ok()? * speed_scale,
        signal_no: t[5].parse().ok()?,
        grade: t[6].parse().ok()?,
        curvature: t[7].parse().ok()?,
        num_directions: t[8].parse().ok()?,
        speed_variation: t[9].parse().ok()?,
        has_catenary: truthy(t[10]),
        signals_at_nodes: t.get(11).map(|s| (*s).to_owned()).unwrap_or_default(),
        region: field_or(t, 12, "ND Region"),
    })
}

pub fn parse_link_file(text: &str) -> Result<Vec<TrainLink>> {
    let text = sanitize(text);
    let mut lines = text.lines().enumerate();
    let Some((header_idx, header)) = lines.by_ref().find(|(_, l)| !l.trim().is_empty()) else {
        return Err(Error::Parse { line: 1, message: "empty train link file".into() });
    };
    let header_line = header_idx + 1;
    let head: Vec<&str> = header.split('\t').map(str::trim).collect();
    if head.len() < 3 {
        return Err(Error::Parse {
            line: header_line,
            message: format!("link header needs count and two scales, found {} fields", head.len()),
        });
    }
    let length_scale: f64 = parse_header(head[1], header_line, "length scale")?;
    let speed_scale: f64 = parse_header(head[2], header_line, "speed scale")?;

    let mut links = Vec::new();
    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let t: Vec<&str> = line.split('\t').map(str::trim).collect();
        match parse_link_row(&t, length_scale, speed_scale) {
            Some(link) => links.push(link),
            None => debug!(line = idx + 1, "skipping malformed train link row"),
        }
    }
    Ok(links)
}

pub fn read_link_file(path: &Path) -> Result<Vec<TrainLink>> {
    let text = std::fs::read_to_string(path)?;
    let links = parse_link_file(&text)?;
    info!(path = %path.display(), count = links.len(), "read train link file");
    Ok(links)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nodes_with_scales_and_defaults() {
        let text = "2\t2.0\t3.0\n\
                    1\t10.0\t20.0\t1\t30\tCentral Station\n\
                    2\t5.0\t5.0\t0\t0\n";
        let nodes = parse_node_file(text).unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].user_id, 1);
        assert_eq!(nodes[0].x, 20.0);
        assert_eq!(nodes[0].y, 60.0);
        assert!(nodes[0].is_terminal);
        assert_eq!(nodes[0].dwell_time, 30.0);
        assert_eq!(nodes[0].description, "Central Station");
        // Missing description falls back to the vendor placeholder
        assert_eq!(nodes[1].description, "ND");
        assert!(!nodes[1].is_terminal);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let text = "9\t1.0\t1.0\n\
                    1\t1.0\t1.0\t0\t0\n\
                    oops\tnot\ta\tnode\trow\n\
                    2\t2.0\n\
                    \n\
                    3\t3.0\t3.0\t0\t0\n";
        let nodes = parse_node_file(text).unwrap();
        assert_eq!(nodes.iter().map(|n| n.user_id).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_bad_header_fails_the_file() {
        let err = parse_node_file("3\tx\t1.0\n1\t1\t1\t0\t0\n").unwrap_err();
        match err {
            crate::Error::Parse { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("x scale"), "{message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(parse_node_file("").is_err());
        assert!(parse_node_file("5\t1.0\n").is_err());
    }

    #[test]
    fn test_parse_links_directions_and_optionals() {
        let text = "2\t0.5\t2.0\n\
                    10\t1\t2\t100.0\t50.0\t7\t0.5\t0.1\t2\t5.0\t1\tS1;S2\tNorth\n\
                    11\t2\t3\t80.0\t40.0\t0\t0\t0\t1\t0\t0\n";
        let links = parse_link_file(text).unwrap();

        assert_eq!(links.len(), 2);
        let l = &links[0];
        assert_eq!((l.user_id, l.from_id, l.to_id), (10, 1, 2));
        assert_eq!(l.length, 50.0); // 100 * 0.5
        assert_eq!(l.max_speed, 100.0); // 50 * 2
        assert_eq!(l.signal_no, 7);
        assert!(l.is_bidirectional());
        assert!(l.has_catenary);
        assert_eq!(l.signals_at_nodes, "S1;S2");
        assert_eq!(l.region, "North");

        assert!(!links[1].is_bidirectional());
        assert_eq!(links[1].signals_at_nodes, "");
        assert_eq!(links[1].region, "ND Region");
    }

    #[test]
    fn test_control_characters_are_stripped() {
        let text = "1\t1.0\t1.0\n1\x00\t4.0\t5.0\t0\t12\x0c\n";
        let nodes = parse_node_file(text).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].user_id, 1);
        assert_eq!(nodes[0].dwell_time, 12.0);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "1\t1.0\t1.0\r\n1\t2.0\t3.0\t0\t0\r\n";
        let nodes = parse_node_file(text).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].x, 2.0);
    }
}
