//! Node instances as exported objects

use crate::document::{MapObject, Shape, Xy};
use crate::snapshot::NodeTypeSnapshot;
use mapsmith_core::{ConnectType, Coord, ItemId, LabelData, LabelTypeItem, NodeInstance, Value};
use std::collections::BTreeMap;

/// Label fields keyed by field name, in label type field order.
///
/// Fields without a name fall back to their id. Returns `None` for an unknown
/// label type.
pub fn project_label(
    label: &LabelData,
    label_types: &BTreeMap<ItemId, LabelTypeItem>,
) -> Option<BTreeMap<String, Value>> {
    let label_type = label_types.get(&label.label_type)?;
    Some(
        label_type
            .fields
            .iter()
            .map(|field| {
                let key = if field.name.is_empty() {
                    field.id.clone()
                } else {
                    field.name.clone()
                };
                let value = label.fields.get(&field.id).cloned().unwrap_or_default();
                (key, value)
            })
            .collect(),
    )
}

fn rebase(c: Coord, origin: Coord) -> Xy {
    Xy {
        x: c.x as i64 - origin.x as i64,
        y: c.y as i64 - origin.y as i64,
    }
}

/// Convert one node instance, or `None` if it has no points
pub fn node_object(
    instance: &NodeInstance,
    node_type: &NodeTypeSnapshot,
    label_types: &BTreeMap<ItemId, LabelTypeItem>,
    id: u32,
) -> Option<MapObject> {
    let origin = instance.node.origin()?;
    let points = &instance.node.points;
    let single = points.len() == 1;

    let mut properties = BTreeMap::new();
    for (idx, point) in points.iter().enumerate() {
        let Some(fields) = point
            .label
            .as_ref()
            .and_then(|l| project_label(l, label_types))
        else {
            continue;
        };
        if single {
            properties.extend(fields);
        } else {
            properties.insert(idx.to_string(), Value::Object(fields));
        }
    }

    let polyline = if single {
        Vec::new()
    } else {
        points.iter().map(|p| rebase(p.coord(), origin)).collect()
    };
    let edges = if node_type.connect_type == ConnectType::Graph {
        instance
            .node
            .edges
            .iter()
            .map(|e| [rebase(e.0, origin), rebase(e.1, origin)])
            .collect()
    } else {
        Vec::new()
    };

    Some(MapObject {
        id,
        name: node_type.name.clone(),
        kind: node_type.name.clone(),
        shape: if single { Shape::Point } else { Shape::Polyline },
        x: origin.x,
        y: origin.y,
        width: 0,
        height: 0,
        rotation: 0,
        visible: true,
        polyline,
        edges,
        properties,
    })
}
