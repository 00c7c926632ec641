//! Cut enumeration as a record stream.
//!
//! Front-ends consume cuts as CSV-like rows: timestamp, cutter instance,
//! terminals, side sizes, cut size, and -- when enabled -- the cut arc IDs
//! and a full state dump. The writer emits the header lazily so callers can
//! hand it any `io::Write`.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Instant;

use crate::config::{Config, DumpState, ReportCuts};
use crate::cutter::CutterStateDump;
use crate::error::CoreError;
use crate::geo::GeoPos;
use crate::graph::{validate_cutter_input, AdjacencyArray, FlowGraph};
use crate::ids::BitSet;
use crate::multi_cutter::{CutterFactory, SimpleCutter};

/// One enumerated cut.
#[derive(Clone, Debug)]
pub struct CutRecord {
    pub time_us: u64,
    pub cutter_id: usize,
    pub source: Option<u32>,
    pub target: Option<u32>,
    pub small_side_size: u32,
    pub large_side_size: u32,
    pub cut_size: u32,
    /// Cut arc IDs interleaved with their back arcs; present under
    /// `report_cuts = yes`.
    pub cut_arcs: Option<Vec<u32>>,
    /// Full cutter state; present under `dump_state = yes`.
    pub state: Option<CutterStateDump>,
}

fn bits_string(bits: &BitSet) -> String {
    (0..bits.len() as u32)
        .map(|i| if bits.get(i) { '1' } else { '0' })
        .collect()
}

fn ids_string(ids: &[u32]) -> String {
    let mut out = String::new();
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&id.to_string());
    }
    out
}

/// Streams [`CutRecord`]s as CSV rows.
pub struct CutWriter<W: Write> {
    out: W,
    report_cuts: bool,
    dump_state: bool,
    header_written: bool,
}

impl<W: Write> CutWriter<W> {
    pub fn new(out: W, config: &Config) -> Self {
        Self {
            out,
            report_cuts: config.report_cuts == ReportCuts::Yes,
            dump_state: config.dump_state == DumpState::Yes,
            header_written: false,
        }
    }

    fn write_header(&mut self) -> io::Result<()> {
        write!(
            self.out,
            "time,cutter_instance,source_node,target_node,small_side_size,large_side_size,cut_size"
        )?;
        if self.report_cuts {
            write!(self.out, ",cut")?;
        }
        if self.dump_state {
            write!(
                self.out,
                ",source_assimilated,target_assimilated,source_reachable,target_reachable,flow"
            )?;
        }
        writeln!(self.out)
    }

    pub fn write_record(&mut self, record: &CutRecord) -> io::Result<()> {
        if !self.header_written {
            self.write_header()?;
            self.header_written = true;
        }
        let fmt_node = |n: Option<u32>| n.map_or("-1".to_string(), |v| v.to_string());
        write!(
            self.out,
            "{},{},{},{},{},{},{}",
            record.time_us,
            record.cutter_id,
            fmt_node(record.source),
            fmt_node(record.target),
            record.small_side_size,
            record.large_side_size,
            record.cut_size
        )?;
        if self.report_cuts {
            write!(
                self.out,
                ",{}",
                record.cut_arcs.as_deref().map(ids_string).unwrap_or_default()
            )?;
        }
        if self.dump_state {
            match &record.state {
                Some(state) => write!(
                    self.out,
                    ",{},{},{},{},{}",
                    bits_string(&state.source_assimilated),
                    bits_string(&state.target_assimilated),
                    bits_string(&state.source_reachable),
                    bits_string(&state.target_reachable),
                    bits_string(&state.flow),
                )?,
                None => write!(self.out, ",,,,,")?,
            }
        }
        writeln!(self.out)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Runs the configured ensemble over `graph` and streams every enumerated
/// cut in dominance order.
pub fn enumerate_cuts<W: Write + Send>(
    graph: &AdjacencyArray,
    geo_pos: Option<&[GeoPos]>,
    config: &Config,
    out: W,
) -> Result<W, CoreError> {
    config.validate()?;
    validate_cutter_input(graph, config.requires_non_negative_weights())?;
    if graph.node_count() < 2 {
        return Err(CoreError::Input(
            "cut enumeration needs at least two nodes".into(),
        ));
    }
    if let Some(source) = config.source {
        if source >= graph.node_count() {
            return Err(CoreError::Input("source node ID out of bounds".into()));
        }
    }
    if let Some(target) = config.target {
        if target >= graph.node_count() {
            return Err(CoreError::Input("target node ID out of bounds".into()));
        }
    }

    let factory = CutterFactory::new(config.clone());
    let terminals = factory.select_terminals(graph.node_count(), geo_pos, config.random_seed);

    let mut cutter = SimpleCutter::new(graph, config.clone());
    cutter.init(terminals)?;

    let report_cuts = config.report_cuts == ReportCuts::Yes;
    let dump_state = config.dump_state == DumpState::Yes && config.cutter_count == 1;
    let max_cut_size = config.max_cut_size;
    let start = Instant::now();
    let writer = Mutex::new(CutWriter::new(out, config));

    cutter.enum_cuts(
        &|c| {
            let mut next_cut = c.flow_intensity() as i64;
            if c.cut_available() {
                next_cut += 1;
            }
            next_cut <= max_cut_size as i64
        },
        &|c, cutter_id| {
            let cut_arcs = report_cuts.then(|| {
                let mut arcs = Vec::with_capacity(2 * c.current_cut().len());
                for &a in c.current_cut() {
                    arcs.push(a);
                    arcs.push(graph.back_arc(a));
                }
                arcs
            });
            let record = CutRecord {
                time_us: start.elapsed().as_micros() as u64,
                cutter_id,
                source: c.terminals().source,
                target: c.terminals().target,
                small_side_size: c.current_smaller_cut_side_size(),
                large_side_size: graph.node_count() - c.current_smaller_cut_side_size(),
                cut_size: c.current_cut().len() as u32,
                cut_arcs,
                state: dump_state.then(|| c.dump_state(graph)),
            };
            // Writer failures surface at flush time; enumeration goes on.
            let _ = writer.lock().unwrap().write_record(&record);
        },
        true,
    );

    Ok(writer.into_inner().unwrap().into_inner())
}
