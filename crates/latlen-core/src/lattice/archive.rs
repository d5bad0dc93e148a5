use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use rustfst::fst_traits::{ExpandedFst, MutableFst};
use rustfst::semirings::Semiring;
use rustfst::{Label, StateId, Tr};
use tracing::debug;

use super::{CompactLattice, CompactLatticeWeight, LatticeError};

/// Where to read a lattice archive from.
///
/// Accepts `ark:<path>` and `ark,<opts>:<path>` (options such as `t`, `s`,
/// `cs`, `o` are ignored; `b` is rejected), a bare path, and `-` or `ark:-`
/// for standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rspecifier {
    Stdin,
    File(PathBuf),
}

impl Rspecifier {
    pub fn parse(spec: &str) -> Result<Self, LatticeError> {
        let target = match spec.split_once(':') {
            Some((prefix, rest)) if is_archive_prefix(prefix) => {
                if prefix.split(',').any(|opt| opt == "b") {
                    return Err(LatticeError::BinaryUnsupported(spec.to_string()));
                }
                rest
            }
            Some((prefix, _)) if prefix.split(',').next() == Some("scp") => {
                return Err(LatticeError::Rspecifier(spec.to_string()));
            }
            _ => spec,
        };
        match target {
            "" => Err(LatticeError::Rspecifier(spec.to_string())),
            "-" => Ok(Rspecifier::Stdin),
            path => Ok(Rspecifier::File(PathBuf::from(path))),
        }
    }

    /// Open the archive for sequential reading.
    pub fn open(&self) -> Result<ArchiveReader<Box<dyn BufRead>>, LatticeError> {
        let reader: Box<dyn BufRead> = match self {
            Rspecifier::Stdin => Box::new(BufReader::new(io::stdin())),
            Rspecifier::File(path) => {
                let file = File::open(path).map_err(|source| LatticeError::Open {
                    path: path.display().to_string(),
                    source,
                })?;
                Box::new(BufReader::new(file))
            }
        };
        Ok(ArchiveReader::new(reader))
    }
}

fn is_archive_prefix(prefix: &str) -> bool {
    let mut parts = prefix.split(',');
    parts.next() == Some("ark")
        && parts.all(|opt| !opt.is_empty() && opt.chars().all(|c| c.is_ascii_lowercase()))
}

/// Sequential reader over a text lattice archive.
///
/// Each entry is a key line followed by the lattice in text form and a blank
/// line:
///
/// ```text
/// utt1
/// 0 1 17 1.5,2.25,3_3_4
/// 1 2 0 0,0.5,
/// 2 0.1,0,
///
/// ```
///
/// Arc lines are `src dst label [weight]` (acceptor) or
/// `src dst ilabel olabel [weight]`; final lines are `state [weight]`. A
/// weight is `graph,acoustic[,t1_t2_...]`. The first state mentioned is the
/// start state.
pub struct ArchiveReader<R> {
    reader: R,
    line_no: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> ArchiveReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: Vec::new(),
        }
    }

    /// Next raw line without its terminator, `None` at end of input.
    fn next_line(&mut self) -> Result<Option<&[u8]>, LatticeError> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        Ok(Some(&self.buf))
    }

    fn read_entry(&mut self) -> Result<Option<(String, CompactLattice)>, LatticeError> {
        let key = loop {
            let line_no = self.line_no + 1;
            let Some(raw) = self.next_line()? else {
                return Ok(None);
            };
            if raw.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let raw = trim_start(raw);
            let key_end = raw
                .iter()
                .position(u8::is_ascii_whitespace)
                .unwrap_or(raw.len());
            let key = parse_utf8(&raw[..key_end], "", line_no)?.to_string();
            let rest = &raw[key_end..];
            if rest.get(1..).is_some_and(|r| r.starts_with(b"\0B")) {
                return Err(LatticeError::BinaryUnsupported(key));
            }
            let rest = parse_utf8(rest, &key, line_no)?.trim();
            if !rest.is_empty() {
                return Err(LatticeError::Parse {
                    key,
                    line: line_no,
                    message: format!("unexpected text after key: '{rest}'"),
                });
            }
            break key;
        };

        let mut builder = LatticeBuilder::default();
        loop {
            let line_no = self.line_no + 1;
            let Some(raw) = self.next_line()? else {
                break;
            };
            if raw.iter().all(u8::is_ascii_whitespace) {
                break;
            }
            let text = parse_utf8(raw, &key, line_no)?;
            builder
                .push_line(text)
                .map_err(|message| LatticeError::Parse {
                    key: key.clone(),
                    line: line_no,
                    message,
                })?;
        }
        let lines = builder.lines.len();
        let lattice = builder.finish().map_err(|message| LatticeError::Parse {
            key: key.clone(),
            line: self.line_no,
            message,
        })?;
        debug!(
            key = key.as_str(),
            states = lattice.num_states(),
            lines,
            "read lattice"
        );
        Ok(Some((key, lattice)))
    }
}

impl<R: BufRead> Iterator for ArchiveReader<R> {
    type Item = Result<(String, CompactLattice), LatticeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_entry().transpose()
    }
}

fn trim_start(raw: &[u8]) -> &[u8] {
    let skip = raw
        .iter()
        .take_while(|b| b.is_ascii_whitespace())
        .count();
    &raw[skip..]
}

fn parse_utf8<'a>(raw: &'a [u8], key: &str, line: usize) -> Result<&'a str, LatticeError> {
    std::str::from_utf8(raw).map_err(|e| LatticeError::Parse {
        key: key.to_string(),
        line,
        message: format!("invalid UTF-8: {e}"),
    })
}

enum LatticeLine {
    Arc {
        src: StateId,
        tr: Tr<CompactLatticeWeight>,
    },
    Final {
        state: StateId,
        weight: CompactLatticeWeight,
    },
}

#[derive(Default)]
struct LatticeBuilder {
    lines: Vec<LatticeLine>,
    max_state: Option<StateId>,
}

impl LatticeBuilder {
    fn push_line(&mut self, text: &str) -> Result<(), String> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        let line = match fields.as_slice() {
            [state] => LatticeLine::Final {
                state: parse_state(state)?,
                weight: CompactLatticeWeight::one(),
            },
            [state, weight] => LatticeLine::Final {
                state: parse_state(state)?,
                weight: parse_weight(weight)?,
            },
            [src, dst, label] => {
                let label = parse_label(label)?;
                arc_line(src, dst, label, label, CompactLatticeWeight::one())?
            }
            [src, dst, label, weight] if weight.contains(',') => {
                let label = parse_label(label)?;
                arc_line(src, dst, label, label, parse_weight(weight)?)?
            }
            [src, dst, ilabel, olabel] => arc_line(
                src,
                dst,
                parse_label(ilabel)?,
                parse_label(olabel)?,
                CompactLatticeWeight::one(),
            )?,
            [src, dst, ilabel, olabel, weight] => arc_line(
                src,
                dst,
                parse_label(ilabel)?,
                parse_label(olabel)?,
                parse_weight(weight)?,
            )?,
            _ => return Err(format!("expected 1 to 5 fields, got {}", fields.len())),
        };
        let highest = match &line {
            LatticeLine::Arc { src, tr } => (*src).max(tr.nextstate),
            LatticeLine::Final { state, .. } => *state,
        };
        self.max_state = Some(self.max_state.map_or(highest, |m| m.max(highest)));
        self.lines.push(line);
        Ok(())
    }

    /// Build the lattice. State ids must be dense enough that every state
    /// could be mentioned by some line; infinite-cost arcs and finals are
    /// dropped.
    fn finish(self) -> Result<CompactLattice, String> {
        let mut lattice = CompactLattice::new();
        let Some(max_state) = self.max_state else {
            return Ok(lattice);
        };
        let limit = self.lines.len().saturating_mul(2).saturating_add(1);
        let num_states = (max_state as usize)
            .checked_add(1)
            .filter(|&n| n <= limit)
            .ok_or_else(|| {
                format!(
                    "state id {max_state} out of range for a lattice of {} lines",
                    self.lines.len()
                )
            })?;
        lattice.add_states(num_states);
        let start = match &self.lines[0] {
            LatticeLine::Arc { src, .. } => *src,
            LatticeLine::Final { state, .. } => *state,
        };
        lattice.set_start(start).map_err(|e| e.to_string())?;
        for line in self.lines {
            match line {
                LatticeLine::Arc { tr, .. } if tr.weight.is_zero() => Ok(()),
                LatticeLine::Arc { src, tr } => lattice.add_tr(src, tr),
                LatticeLine::Final { weight, .. } if weight.is_zero() => Ok(()),
                LatticeLine::Final { state, weight } => lattice.set_final(state, weight),
            }
            .map_err(|e| e.to_string())?;
        }
        Ok(lattice)
    }
}

fn arc_line(
    src: &str,
    dst: &str,
    ilabel: Label,
    olabel: Label,
    weight: CompactLatticeWeight,
) -> Result<LatticeLine, String> {
    Ok(LatticeLine::Arc {
        src: parse_state(src)?,
        tr: Tr::new(ilabel, olabel, weight, parse_state(dst)?),
    })
}

fn parse_state(field: &str) -> Result<StateId, String> {
    field
        .parse()
        .map_err(|e| format!("invalid state '{field}': {e}"))
}

fn parse_label(field: &str) -> Result<Label, String> {
    field
        .parse()
        .map_err(|e| format!("invalid label '{field}': {e}"))
}

fn parse_cost(field: &str) -> Result<f32, String> {
    let cost: f32 = field
        .parse()
        .map_err(|e| format!("invalid cost '{field}': {e}"))?;
    if cost.is_nan() {
        return Err(format!("invalid cost '{field}': NaN"));
    }
    Ok(cost)
}

/// `graph,acoustic[,t1_t2_...]`
fn parse_weight(field: &str) -> Result<CompactLatticeWeight, String> {
    let parts: Vec<&str> = field.split(',').collect();
    let (graph, acoustic, alignment) = match parts.as_slice() {
        [g, a] => (*g, *a, ""),
        [g, a, ali] => (*g, *a, *ali),
        _ => {
            return Err(format!(
                "invalid weight '{field}': expected graph,acoustic[,alignment]"
            ))
        }
    };
    let alignment = alignment
        .split('_')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|e| format!("invalid alignment id '{s}': {e}"))
        })
        .collect::<Result<Vec<u32>, String>>()?;
    let weight = CompactLatticeWeight::new(parse_cost(graph)?, parse_cost(acoustic)?);
    if weight.is_zero() {
        return Ok(CompactLatticeWeight::zero());
    }
    Ok(weight.with_alignment(alignment))
}
