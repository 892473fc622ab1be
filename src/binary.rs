//! Binary serialization of a graph that preserves element identifiers.
//!
//! # Format
//!
//! All integers are stored as little-endian 64-bit values.
//! A sequence is stored as the number of bytes in its packed encoding followed by the packed bytes (see [`utils::encode_sequence`]).
//! There is no header or version field.
//!
//! * The maximum identifier allocated in the graph.
//! * For each vertex in identifier order:
//!   * vertex identifier and the identifier of its conjugate;
//!   * for each outgoing edge that is the canonical half of its pair:
//!     edge identifier, conjugate edge identifier, end vertex, start vertex of the conjugate edge, sequence;
//!   * 0 as a terminator.
//!
//! The stream ends when the input ends.
//! Every vertex gets its own block, because the canonical half of an edge may start from a non-canonical vertex.
//! Restoring is idempotent on vertices that have already been created through their conjugates or as edge endpoints.
//!
//! The graph order `k` is not stored.
//! A graph must be restored into a graph with the same order.

use crate::graph::{ConjugateGraph, GraphCore, VertexData};
use crate::ids::{EdgeId, IdMapper, ReservedIds, VertexId};
use crate::utils;

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;


//-----------------------------------------------------------------------------

// Size of an integer in the format.
const WORD_BYTES: usize = 8;

// Terminates the edge list of a vertex.
const SENTINEL: usize = 0;

// Largest accepted maximum identifier.
// The rest of the identifier space is left for elements created after restoring the graph.
const MAX_STORED_ID: usize = usize::MAX / 2;

/// Mappings from the identifiers in a serialized graph to the identifiers in the restored graph.
///
/// As identifiers are preserved, the mappings are identities over the stored elements.
/// They can be used for validating and retargeting external indexes built against the stored graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoredIds {
    /// Vertex identifiers.
    pub vertices: IdMapper<VertexId>,
    /// Edge identifiers.
    pub edges: IdMapper<EdgeId>,
}

//-----------------------------------------------------------------------------

fn write_word<W: Write>(output: &mut W, value: usize) -> io::Result<()> {
    output.write_all(&(value as u64).to_le_bytes())
}

fn write_sequence<W: Write>(output: &mut W, sequence: &[u8]) -> io::Result<()> {
    let encoded = utils::encode_sequence(sequence);
    write_word(output, encoded.len())?;
    output.write_all(&encoded)
}

/// Writes the graph to the output.
///
/// # Examples
///
/// ```
/// use cdbg_base::ConjugateGraph;
/// use cdbg_base::binary;
///
/// let mut graph: ConjugateGraph = ConjugateGraph::new(4);
/// let u = graph.add_vertex(());
/// let v = graph.add_vertex(());
/// let edge = graph.add_edge(u, v, b"GATTACACAT");
///
/// let mut buffer: Vec<u8> = Vec::new();
/// binary::write_graph(graph.core(), &mut buffer).unwrap();
///
/// let mut copy: ConjugateGraph = ConjugateGraph::new(4);
/// let ids = binary::read_graph(&mut buffer.as_slice(), &mut copy).unwrap();
/// let restored = ids.edges.get(edge.id()).unwrap();
/// assert_eq!(restored, edge);
/// assert_eq!(copy.sequence(restored), b"GATTACACAT");
/// assert_eq!(copy.max_id(), graph.max_id());
/// ```
pub fn write_graph<V: VertexData, W: Write>(graph: &GraphCore<V>, output: &mut W) -> io::Result<()> {
    write_word(output, graph.max_id())?;
    for vertex in graph.vertices() {
        write_word(output, vertex.id())?;
        write_word(output, graph.conjugate(vertex).id())?;
        for edge in graph.outgoing_edges(vertex) {
            let conjugate = graph.conjugate(*edge);
            if conjugate < *edge {
                continue;
            }
            write_word(output, edge.id())?;
            write_word(output, conjugate.id())?;
            write_word(output, graph.edge_end(*edge).id())?;
            write_word(output, graph.edge_start(conjugate).id())?;
            write_sequence(output, graph.sequence(*edge))?;
        }
        write_word(output, SENTINEL)?;
    }
    Ok(())
}

//-----------------------------------------------------------------------------

fn has_data<R: BufRead>(input: &mut R) -> Result<bool, String> {
    let buffer = input.fill_buf().map_err(|x| x.to_string())?;
    Ok(!buffer.is_empty())
}

fn read_word<R: BufRead>(input: &mut R) -> Result<usize, String> {
    let mut buffer = [0; WORD_BYTES];
    input.read_exact(&mut buffer).map_err(|x| format!("Truncated graph stream: {}", x))?;
    let value = u64::from_le_bytes(buffer);
    usize::try_from(value).map_err(|_| format!("Value {} does not fit in the address space", value))
}

// Reads an identifier pair and checks that it is a valid reserved pair.
fn read_pair<R: BufRead>(input: &mut R, reserved: &ReservedIds, what: &str) -> Result<(usize, usize), String> {
    let id = read_word(input)?;
    let conjugate = read_word(input)?;
    check_pair((id, conjugate), reserved, what)?;
    Ok((id, conjugate))
}

fn check_pair(ids: (usize, usize), reserved: &ReservedIds, what: &str) -> Result<(), String> {
    for id in [ids.0, ids.1] {
        if !reserved.contains(id) {
            return Err(format!("Invalid {} identifier {} (maximum identifier {})", what, id, reserved.max_id()));
        }
    }
    if ids.0 == ids.1 {
        return Err(format!("The {} {} is its own conjugate", what, ids.0));
    }
    Ok(())
}

fn read_sequence<R: BufRead>(input: &mut R) -> Result<Vec<u8>, String> {
    let len = read_word(input)?;
    let mut encoded: Vec<u8> = Vec::new();
    input.by_ref().take(len as u64).read_to_end(&mut encoded).map_err(|x| x.to_string())?;
    if encoded.len() != len {
        return Err(format!("Truncated graph stream: expected a sequence of {} bytes, got {}", len, encoded.len()));
    }
    Ok(utils::decode_sequence(&encoded))
}

// Creates the vertex pair unless it already exists.
fn try_add_vertex<V: VertexData>(
    graph: &mut ConjugateGraph<V>, reserved: &ReservedIds, mapper: &mut IdMapper<VertexId>, ids: (usize, usize)
) -> Result<VertexId, String> {
    if let Some(vertex) = mapper.get(ids.0) {
        if mapper.get(ids.1) != Some(graph.conjugate(vertex)) {
            return Err(format!("Vertex {} was stored with conjugates {} and {}", ids.0, graph.conjugate(vertex).id(), ids.1));
        }
        return Ok(vertex);
    }
    if graph.contains_id(ids.0) || graph.contains_id(ids.1) {
        return Err(format!("Vertex identifiers ({}, {}) are already in use", ids.0, ids.1));
    }
    let mut distributor = reserved.segment(ids.0, ids.1);
    let vertex = graph.add_vertex_with(V::default(), &mut distributor);
    mapper.insert(ids.0, vertex);
    mapper.insert(ids.1, graph.conjugate(vertex));
    Ok(vertex)
}

/// Replaces the graph with one read from the input.
///
/// The graph is cleared first, notifying the observers.
/// The restored elements have the stored identifiers, and fresh identifiers allocated afterwards continue from the stored maximum.
/// Observers are notified of the restored elements as they are created.
///
/// Returns the mappings from stored identifiers to restored identifiers.
/// If the stream is malformed, returns an error and leaves the graph in an unspecified but consistent state.
/// Errors include an empty or truncated stream, a maximum identifier that leaves no room for new elements, invalid or reused identifiers, inconsistent conjugate pairs, duplicate edges, and sequences that are too short for the graph order.
pub fn read_graph<V: VertexData, R: BufRead>(input: &mut R, graph: &mut ConjugateGraph<V>) -> Result<RestoredIds, String> {
    graph.clear();
    if !has_data(input)? {
        return Err(String::from("Empty graph stream"));
    }
    let max_id = read_word(input)?;
    if max_id > MAX_STORED_ID {
        return Err(format!("Invalid maximum identifier {} (the limit is {})", max_id, MAX_STORED_ID));
    }
    let reserved = graph.reserve_ids(max_id);

    let mut result = RestoredIds::default();
    while has_data(input)? {
        let start_ids = read_pair(input, &reserved, "vertex")?;
        let start = try_add_vertex(graph, &reserved, &mut result.vertices, start_ids)?;
        loop {
            let edge_id = read_word(input)?;
            if edge_id == SENTINEL {
                break;
            }
            let conjugate_id = read_word(input)?;
            check_pair((edge_id, conjugate_id), &reserved, "edge")?;
            let end_ids = read_pair(input, &reserved, "vertex")?;
            let sequence = read_sequence(input)?;
            let end = try_add_vertex(graph, &reserved, &mut result.vertices, end_ids)?;

            if result.edges.contains(edge_id) {
                return Err(format!("Edge identifier {} is not unique", edge_id));
            }
            if graph.contains_id(edge_id) || graph.contains_id(conjugate_id) {
                return Err(format!("Edge identifiers ({}, {}) are already in use", edge_id, conjugate_id));
            }
            if sequence.len() <= graph.k() {
                return Err(format!("Edge {} has a sequence of length {}, which is too short for k = {}", edge_id, sequence.len(), graph.k()));
            }
            let mut distributor = reserved.segment(edge_id, conjugate_id);
            let edge = graph.add_edge_with(start, end, &sequence, &mut distributor);
            result.edges.insert(edge_id, edge);
            result.edges.insert(conjugate_id, graph.conjugate(edge));
        }
    }

    Ok(result)
}

//-----------------------------------------------------------------------------

/// Writes the graph to a file, optionally gzip-compressed.
///
/// Prints progress information to stderr if `verbose` is set.
pub fn save_graph<V: VertexData, P: AsRef<Path>>(graph: &GraphCore<V>, filename: P, compress: bool, verbose: bool) -> Result<(), String> {
    if verbose {
        eprintln!("Writing {} vertices and {} edges to {}", graph.size(), graph.edge_count(), filename.as_ref().display());
    }
    let file = File::create(&filename).map_err(|x| x.to_string())?;
    let mut writer = BufWriter::new(file);
    if compress {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        write_graph(graph, &mut encoder).map_err(|x| x.to_string())?;
        writer = encoder.finish().map_err(|x| x.to_string())?;
    } else {
        write_graph(graph, &mut writer).map_err(|x| x.to_string())?;
    }
    writer.flush().map_err(|x| x.to_string())?;
    if verbose {
        if let Some(size) = utils::file_size(&filename) {
            eprintln!("File size: {}", size);
        }
    }
    Ok(())
}

/// Replaces the graph with one loaded from a file, which may be gzip-compressed.
///
/// See [`read_graph`] for details.
/// Prints progress information to stderr if `verbose` is set.
pub fn load_graph<V: VertexData, P: AsRef<Path>>(filename: P, graph: &mut ConjugateGraph<V>, verbose: bool) -> Result<RestoredIds, String> {
    if verbose {
        eprintln!("Loading graph from {}", filename.as_ref().display());
    }
    let mut reader = utils::open_file(&filename)?;
    let result = read_graph(&mut reader, graph).map_err(|x| format!("{}: {}", filename.as_ref().display(), x))?;
    if verbose {
        eprintln!("Loaded {} vertices and {} edges with maximum identifier {}", graph.size(), graph.edge_count(), graph.max_id());
    }
    Ok(result)
}

//-----------------------------------------------------------------------------
