//! Dotted node addresses: `0` is the first root, `0.2` its third child.

use anyhow::{anyhow, bail, Result};
use canvas_core::{Canvas, NodeId};

pub fn parse(address: &str) -> Result<Vec<usize>> {
    let address = address.trim();
    if address.is_empty() {
        bail!("Empty node address");
    }
    address
        .split('.')
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| anyhow!("Invalid node address '{}': '{}' is not an index", address, part))
        })
        .collect()
}

pub fn format(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|index| index.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

pub fn resolve(canvas: &Canvas, address: &str) -> Result<NodeId> {
    let indices = parse(address)?;
    canvas
        .locate(&indices)
        .ok_or_else(|| anyhow!("No node at address {}", address))
}

/// Address of an attached node, or its id when it has none
pub fn describe(canvas: &Canvas, node: NodeId) -> String {
    canvas
        .path_indices(node)
        .map(|indices| format(&indices))
        .unwrap_or_else(|| node.to_string())
}
