//! 2-D depiction of a molecular graph
//!
//! Coordinates come from stress minimisation over graph distances, started
//! from a golden-angle spiral, with ring members pulled onto regular polygons. Each fragment is laid out on its own
//! and fragments are placed left to right. The drawing is an SVG document.

use super::smiles::{BondOrder, MolGraph};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::VecDeque;
use std::fmt::Write;

/// Ideal bond length in layout units.
const BOND: f64 = 1.0;
const EPOCHS: usize = 60;
const FRAGMENT_GAP: f64 = 1.5;
const SCALE: f64 = 40.0;
const MARGIN: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Laid-out molecule ready for drawing.
pub struct Depiction<'a> {
    graph: &'a MolGraph,
    pub coords: Vec<Point>,
}

impl<'a> Depiction<'a> {
    pub fn new(graph: &'a MolGraph) -> Self {
        let mut coords = vec![Point { x: 0.0, y: 0.0 }; graph.atom_count()];
        let mut offset_x = 0.0;

        for fragment in graph.fragments() {
            let local = layout_fragment(graph, &fragment);
            let min_x = local.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
            let max_x = local.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
            let mid_y = {
                let min_y = local.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
                let max_y = local.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
                (min_y + max_y) / 2.0
            };
            for (atom, p) in fragment.iter().zip(&local) {
                coords[*atom] = Point { x: p.x - min_x + offset_x, y: p.y - mid_y };
            }
            offset_x += (max_x - min_x) + FRAGMENT_GAP;
        }

        Self { graph, coords }
    }

    /// Render as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        let width = (max_x - min_x) * SCALE + 2.0 * MARGIN;
        let height = (max_y - min_y) * SCALE + 2.0 * MARGIN;
        let px = |p: Point| ((p.x - min_x) * SCALE + MARGIN, (p.y - min_y) * SCALE + MARGIN);

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.1} {h:.1}">"#,
            w = width,
            h = height
        );
        svg.push_str(r#"<rect width="100%" height="100%" fill="white"/>"#);
        svg.push_str(r##"<g stroke="#202020" stroke-width="2" stroke-linecap="round">"##);

        for bond in &self.graph.bonds {
            let (x1, y1) = px(self.coords[bond.a]);
            let (x2, y2) = px(self.coords[bond.b]);
            let (dx, dy) = (x2 - x1, y2 - y1);
            let len = (dx * dx + dy * dy).sqrt().max(1e-6);
            // unit normal
            let (nx, ny) = (-dy / len * 4.0, dx / len * 4.0);
            let line = |svg: &mut String, o: f64, dashed: bool| {
                let _ = write!(
                    svg,
                    r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}"{}/>"#,
                    x1 + nx * o,
                    y1 + ny * o,
                    x2 + nx * o,
                    y2 + ny * o,
                    if dashed { r#" stroke-dasharray="4,3""# } else { "" }
                );
            };
            match bond.order {
                BondOrder::Single => line(&mut svg, 0.0, false),
                BondOrder::Double => {
                    line(&mut svg, -0.5, false);
                    line(&mut svg, 0.5, false);
                }
                BondOrder::Triple => {
                    line(&mut svg, -1.0, false);
                    line(&mut svg, 0.0, false);
                    line(&mut svg, 1.0, false);
                }
                BondOrder::Quadruple => {
                    for o in [-1.5, -0.5, 0.5, 1.5] {
                        line(&mut svg, o, false);
                    }
                }
                BondOrder::Aromatic => {
                    line(&mut svg, 0.0, false);
                    line(&mut svg, 1.0, true);
                }
            }
        }
        svg.push_str("</g>");

        svg.push_str(r#"<g font-family="sans-serif" font-size="14" text-anchor="middle" dominant-baseline="central">"#);
        for (idx, atom) in self.graph.atoms.iter().enumerate() {
            let Some(label) = self.label(idx) else { continue };
            let (x, y) = px(self.coords[idx]);
            let w = 8.0 * label.chars().count() as f64 + 6.0;
            let _ = write!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="18" fill="white"/><text x="{:.1}" y="{:.1}" fill="{}">{}</text>"#,
                x - w / 2.0,
                y - 9.0,
                w,
                x,
                y,
                atom.element.color,
                label
            );
        }
        svg.push_str("</g></svg>");
        svg
    }

    /// `data:` URI with the base64-encoded SVG, for inline `<img>` use.
    pub fn data_uri(&self) -> String {
        format!("data:image/svg+xml;base64,{}", STANDARD.encode(self.to_svg()))
    }

    /// Atom label, or `None` for plain skeletal carbons.
    fn label(&self, idx: usize) -> Option<String> {
        let atom = &self.graph.atoms[idx];
        let is_carbon = atom.element.symbol == "C";
        let isolated = self.graph.degree(idx) == 0;
        if is_carbon && atom.charge == 0 && atom.isotope.is_none() && !isolated {
            return None;
        }

        let mut label = String::new();
        if let Some(iso) = atom.isotope {
            label.push_str(&iso.to_string());
        }
        label.push_str(atom.element.symbol);
        match self.graph.hydrogen_count(idx) {
            0 => {}
            1 => label.push('H'),
            n => {
                label.push('H');
                label.push_str(&n.to_string());
            }
        }
        match atom.charge {
            0 => {}
            1 => label.push('+'),
            -1 => label.push('−'),
            c if c > 0 => {
                let _ = write!(label, "{c}+");
            }
            c => {
                let _ = write!(label, "{}−", -c);
            }
        }
        Some(label)
    }

    fn bounds(&self) -> (f64, f64, f64, f64) {
        if self.coords.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }
        self.coords.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(a, b, c, d), p| (a.min(p.x), b.min(p.y), c.max(p.x), d.max(p.y)),
        )
    }
}

/// Lay out one connected fragment; returns coordinates aligned with `atoms`.
fn layout_fragment(graph: &MolGraph, atoms: &[usize]) -> Vec<Point> {
    let n = atoms.len();
    if n == 1 {
        return vec![Point { x: 0.0, y: 0.0 }];
    }
    let local = |atom: usize| atoms.binary_search(&atom).ok();

    // local adjacency
    let mut adj = vec![Vec::new(); n];
    for bond in &graph.bonds {
        if let (Some(a), Some(b)) = (local(bond.a), local(bond.b)) {
            adj[a].push(b);
            adj[b].push(a);
        }
    }

    // target distances: chain geometry from graph distance, overridden by ring chords
    let hops = all_pairs_hops(&adj);
    let mut target = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            let d = hops[i][j] as f64;
            target[i][j] = if hops[i][j] <= 1 { d * BOND } else { d * BOND * 0.866 };
        }
    }
    for bond in graph.bonds.iter().filter(|b| b.ring_closure) {
        let (Some(a), Some(b)) = (local(bond.a), local(bond.b)) else { continue };
        let ring = ring_path(&adj, a, b);
        let k = ring.len();
        if k < 3 {
            continue;
        }
        let radius = BOND / (2.0 * (std::f64::consts::PI / k as f64).sin());
        for (p, &i) in ring.iter().enumerate() {
            for (q, &j) in ring.iter().enumerate() {
                if i == j {
                    continue;
                }
                let steps = (p as isize - q as isize).unsigned_abs().min(k - (p as isize - q as isize).unsigned_abs());
                let chord = 2.0 * radius * (std::f64::consts::PI * steps as f64 / k as f64).sin();
                target[i][j] = chord;
            }
        }
    }

    // deterministic start: golden-angle spiral
    let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    let mut pos: Vec<Point> = (0..n)
        .map(|i| {
            let r = (i as f64 + 0.5).sqrt();
            let t = i as f64 * golden;
            Point { x: r * t.cos(), y: r * t.sin() }
        })
        .collect();

    let max_d = target.iter().flatten().cloned().fold(BOND, f64::max);
    let eta_max = max_d * max_d;
    let eta_min = 0.01;
    let decay = (eta_min / eta_max).ln() / (EPOCHS as f64 - 1.0);

    for epoch in 0..EPOCHS {
        let eta = eta_max * (decay * epoch as f64).exp();
        for i in 0..n {
            for j in (i + 1)..n {
                let d = target[i][j];
                if d <= 0.0 {
                    continue;
                }
                let w = 1.0 / (d * d);
                let mu = (w * eta).min(1.0);
                let (dx, dy) = (pos[i].x - pos[j].x, pos[i].y - pos[j].y);
                let dist = (dx * dx + dy * dy).sqrt().max(1e-9);
                let r = mu * (dist - d) / 2.0;
                let (mx, my) = (r * dx / dist, r * dy / dist);
                pos[i].x -= mx;
                pos[i].y -= my;
                pos[j].x += mx;
                pos[j].y += my;
            }
        }
    }
    pos
}

fn all_pairs_hops(adj: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = adj.len();
    (0..n)
        .map(|src| {
            let mut dist = vec![0usize; n];
            let mut seen = vec![false; n];
            let mut queue = VecDeque::from([src]);
            seen[src] = true;
            while let Some(u) = queue.pop_front() {
                for &v in &adj[u] {
                    if !seen[v] {
                        seen[v] = true;
                        dist[v] = dist[u] + 1;
                        queue.push_back(v);
                    }
                }
            }
            dist
        })
        .collect()
}

/// Shortest path from `a` to `b` that does not use the direct a-b bond.
fn ring_path(adj: &[Vec<usize>], a: usize, b: usize) -> Vec<usize> {
    let n = adj.len();
    let mut parent = vec![usize::MAX; n];
    let mut queue = VecDeque::from([a]);
    parent[a] = a;
    while let Some(u) = queue.pop_front() {
        if u == b {
            break;
        }
        for &v in &adj[u] {
            if u == a && v == b {
                continue;
            }
            if parent[v] == usize::MAX {
                parent[v] = u;
                queue.push_back(v);
            }
        }
    }
    if parent[b] == usize::MAX {
        return Vec::new();
    }
    let mut path = vec![b];
    let mut cur = b;
    while cur != a {
        cur = parent[cur];
        path.push(cur);
    }
    path
}
