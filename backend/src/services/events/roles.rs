use common::model::event::EventRole;
use std::collections::HashSet;

pub const ROLE_PALETTE: [&str; 20] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E2",
    "#F8B739", "#52BE80", "#E74C3C", "#3498DB", "#9B59B6", "#1ABC9C", "#F39C12", "#E67E22",
    "#34495E", "#16A085", "#27AE60", "#2980B9",
];

/// Roles for `names`, in order. Names are trimmed, empty ones dropped and
/// duplicates collapsed onto the first occurrence. A name already present in
/// `existing` keeps its color; new names get a random palette color not yet
/// used by the event, or any palette color once all are taken.
pub fn assign_role_colors(names: &[String], existing: &[EventRole]) -> Vec<EventRole> {
    let mut seen = HashSet::new();
    let unique: Vec<&str> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty() && seen.insert(*n))
        .collect();

    let kept_color = |name: &str| {
        existing
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.color.clone())
    };
    let mut used: HashSet<String> = unique.iter().filter_map(|&n| kept_color(n)).collect();

    unique
        .into_iter()
        .map(|name| {
            let color = kept_color(name).unwrap_or_else(|| {
                let free: Vec<&str> = ROLE_PALETTE
                    .iter()
                    .copied()
                    .filter(|c| !used.contains(*c))
                    .collect();
                let pool = if free.is_empty() { &ROLE_PALETTE[..] } else { &free[..] };
                let color = pool[fastrand::usize(..pool.len())].to_string();
                used.insert(color.clone());
                color
            });
            EventRole {
                name: name.to_string(),
                color,
            }
        })
        .collect()
}
