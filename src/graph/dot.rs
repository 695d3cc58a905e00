//! Graphviz export of a co-occurrence graph.

use super::Graph;
use std::io;

impl Graph {
    /// Write the graph in DOT format. Nodes are labeled with `labels`, falling
    /// back to the node index; edges carry their weight as label and pen width.
    pub fn write_dot(&self, mut out: impl io::Write, name: &str, labels: &[String]) -> io::Result<()> {
        let max = self.max_weight().unwrap_or(1.).max(f64::MIN_POSITIVE);
        writeln!(out, "graph \"{}\" {{", escape(name))?;
        writeln!(out, "  node [shape=ellipse];")?;
        for v in 0..self.num_nodes() {
            let label = labels.get(v).cloned().unwrap_or_else(|| v.to_string());
            writeln!(out, "  n{v} [label=\"{}\"];", escape(&label))?;
        }
        for e in self.edges() {
            writeln!(
                out,
                "  n{} -- n{} [label=\"{}\", penwidth={:.2}];",
                e.a,
                e.b,
                e.weight,
                1. + 3. * e.weight / max
            )?;
        }
        writeln!(out, "}}")
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
