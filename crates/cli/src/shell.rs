//! Command interpreter behind `cachectl`.
//!
//! Kept separate from `main` so the whole command set can be driven from
//! tests with an in-memory output buffer.

use anyhow::{anyhow, bail, Context, Result};
use cache::{
    CacheReader, CacheWriter, CompactLocation, Member, MemberKind, RelationRecord, WayKind,
    WayRecord,
};
use config::CacheConfig;
use std::io::Write;

/// Whether the caller should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Which pass the shell is in. Writing and reading never overlap.
enum Phase {
    Idle,
    Writing(CacheWriter),
    Reading(CacheReader),
}

pub struct Shell {
    cfg: CacheConfig,
    phase: Phase,
}

impl Shell {
    pub fn new(cfg: CacheConfig) -> Self {
        Self {
            cfg,
            phase: Phase::Idle,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.cfg
    }

    /// Executes one command line, writing replies to `out`.
    ///
    /// Command failures are reported as `ERR ...` lines; only failures to
    /// write to `out` are returned as errors.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = parts.collect();

        let cmd = cmd.to_uppercase();
        if cmd == "EXIT" || cmd == "QUIT" {
            self.shutdown(out)?;
            writeln!(out, "bye")?;
            return Ok(Flow::Exit);
        }

        if let Err(e) = self.dispatch(&cmd, &args, out) {
            writeln!(out, "ERR {}: {:#}", cmd.to_lowercase(), e)?;
        }
        Ok(Flow::Continue)
    }

    fn dispatch<W: Write>(&mut self, cmd: &str, args: &[&str], out: &mut W) -> Result<()> {
        match cmd {
            "CREATE" => {
                self.phase = Phase::Writing(CacheWriter::create(&self.cfg)?);
                writeln!(out, "OK")?;
            }
            "WAY" => {
                let (id, rest) = split_id(args, "WAY id node...")?;
                let nodes = rest.iter().map(|s| parse_id(s)).collect::<Result<Vec<_>>>()?;
                self.writer()?.add_way(id, &WayRecord::new(nodes))?;
                writeln!(out, "OK")?;
            }
            "REL" => {
                let (id, rest) = split_id(args, "REL id kind:id[:role]... [-- key=value...]")?;
                let relation = parse_relation(rest)?;
                self.writer()?.add_relation(id, &relation)?;
                writeln!(out, "OK")?;
            }
            "COAST" => {
                let [node, way, kind] = args else {
                    bail!("usage: COAST node way kind");
                };
                let location = CompactLocation::try_new(parse_id(way)?, parse_kind(kind)?)
                    .ok_or_else(|| anyhow!("way id {} does not fit in 62 bits", way))?;
                self.writer()?.add_mapped_way(parse_id(node)?, location)?;
                writeln!(out, "OK")?;
            }
            "FINISH" => {
                match &mut self.phase {
                    Phase::Writing(w) => w.finish()?,
                    _ => bail!("no write pass in progress"),
                }
                self.phase = Phase::Reading(CacheReader::open(&self.cfg)?);
                writeln!(out, "OK")?;
            }
            "OPEN" => {
                if matches!(self.phase, Phase::Writing(_)) {
                    bail!("write pass in progress (use FINISH)");
                }
                self.phase = Phase::Reading(CacheReader::open(&self.cfg)?);
                writeln!(out, "OK")?;
            }
            "GETWAY" => {
                let id = single_id(args, "GETWAY id")?;
                match self.reader()?.read_way(id)? {
                    Some(way) => writeln!(out, "{}", join(&way.nodes))?,
                    None => writeln!(out, "(nil)")?,
                }
            }
            "GETREL" => {
                let id = single_id(args, "GETREL id")?;
                match self.reader()?.read_relation(id)? {
                    Some(rel) => print_relation(&rel, out)?,
                    None => writeln!(out, "(nil)")?,
                }
            }
            "NODEREL" | "WAYREL" => {
                let id = single_id(args, &format!("{} id", cmd))?;
                let reader = self.reader()?;
                let mut rels = Vec::new();
                let collect = |rel: u64| {
                    rels.push(rel);
                    false
                };
                if cmd == "NODEREL" {
                    reader.for_each_relation_of_node(id, collect);
                } else {
                    reader.for_each_relation_of_way(id, collect);
                }
                if rels.is_empty() {
                    writeln!(out, "(none)")?;
                } else {
                    writeln!(out, "{}", join(&rels))?;
                }
            }
            "MAPPED" => {
                let node = single_id(args, "MAPPED node")?;
                let mut lines = Vec::new();
                self.reader()?.for_each_mapped_way(node, |loc| {
                    lines.push(format!("{} {}", loc.way_id(), kind_name(loc.kind())));
                    false
                });
                if lines.is_empty() {
                    writeln!(out, "(none)")?;
                }
                for l in lines {
                    writeln!(out, "{}", l)?;
                }
            }
            "STATS" => {
                let s = self.reader()?.stats();
                writeln!(
                    out,
                    "ways={} relations={} node_links={} way_links={} mapped_ways={}",
                    s.ways, s.relations, s.node_links, s.way_links, s.mapped_ways
                )?;
            }
            other => bail!("unknown command {}", other),
        }
        Ok(())
    }

    /// Finishes an open write pass so nothing buffered is lost on exit.
    fn shutdown<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if let Phase::Writing(w) = &mut self.phase {
            if let Err(e) = w.finish() {
                writeln!(out, "ERR finish: {:#}", e)?;
            }
        }
        self.phase = Phase::Idle;
        Ok(())
    }

    fn writer(&mut self) -> Result<&mut CacheWriter> {
        match &mut self.phase {
            Phase::Writing(w) => Ok(w),
            _ => bail!("no write pass in progress (use CREATE)"),
        }
    }

    fn reader(&mut self) -> Result<&mut CacheReader> {
        match &mut self.phase {
            Phase::Reading(r) => Ok(r),
            _ => bail!("cache is not open for reading (use OPEN or FINISH)"),
        }
    }
}

fn parse_id(s: &str) -> Result<u64> {
    s.parse().with_context(|| format!("invalid id '{}'", s))
}

fn single_id(args: &[&str], usage: &str) -> Result<u64> {
    match args {
        [id] => parse_id(id),
        _ => bail!("usage: {}", usage),
    }
}

fn split_id<'a>(args: &'a [&'a str], usage: &str) -> Result<(u64, &'a [&'a str])> {
    match args.split_first() {
        Some((id, rest)) => Ok((parse_id(id)?, rest)),
        None => bail!("usage: {}", usage),
    }
}

/// Accepts `coast`, `empty`, `coast-rev`, `empty-rev` or the raw tag 0..=3.
fn parse_kind(s: &str) -> Result<WayKind> {
    Ok(match s.to_lowercase().as_str() {
        "coast" | "0" => WayKind::CoastlineForward,
        "empty" | "1" => WayKind::EmptyForward,
        "coast-rev" | "2" => WayKind::CoastlineBackward,
        "empty-rev" | "3" => WayKind::EmptyBackward,
        other => bail!("unknown way kind '{}'", other),
    })
}

fn kind_name(kind: WayKind) -> &'static str {
    match kind {
        WayKind::CoastlineForward => "coast",
        WayKind::EmptyForward => "empty",
        WayKind::CoastlineBackward => "coast-rev",
        WayKind::EmptyBackward => "empty-rev",
    }
}

fn parse_member(s: &str) -> Result<Member> {
    let mut it = s.splitn(3, ':');
    let kind = match it.next() {
        Some("n") => MemberKind::Node,
        Some("w") => MemberKind::Way,
        Some("r") => MemberKind::Relation,
        _ => bail!("invalid member '{}' (expected n|w|r:id[:role])", s),
    };
    let id = parse_id(it.next().unwrap_or_default())?;
    let role = it.next().unwrap_or_default();
    Ok(Member::new(kind, id, role))
}

fn parse_relation(args: &[&str]) -> Result<RelationRecord> {
    let split = args.iter().position(|a| *a == "--").unwrap_or(args.len());
    let members = args[..split]
        .iter()
        .map(|m| parse_member(m))
        .collect::<Result<Vec<_>>>()?;
    let tags = args
        .get(split + 1..)
        .unwrap_or_default()
        .iter()
        .map(|t| {
            t.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("invalid tag '{}' (expected key=value)", t))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RelationRecord { members, tags })
}

fn print_relation<W: Write>(rel: &RelationRecord, out: &mut W) -> Result<()> {
    for m in &rel.members {
        let kind = match m.kind {
            MemberKind::Node => 'n',
            MemberKind::Way => 'w',
            MemberKind::Relation => 'r',
        };
        writeln!(out, "{}:{}:{}", kind, m.id, m.role)?;
    }
    for (k, v) in &rel.tags {
        writeln!(out, "{}={}", k, v)?;
    }
    Ok(())
}

fn join(ids: &[u64]) -> String {
    ids.iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
