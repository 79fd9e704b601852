pub const DEFAULT_MAX_LINES: usize = 2_000;

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub max_lines: usize,
}
impl Default for ChunkingConfig {
	fn default() -> Self {
		Self { max_lines: DEFAULT_MAX_LINES }
	}
}

/// A contiguous run of serialized records sent to the model in one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk<'a> {
	pub chunk_index: usize,
	/// Zero-based index of the first line in the full record stream.
	pub start_line: usize,
	pub lines: &'a [String],
}
impl Chunk<'_> {
	/// One past the last line covered by this chunk.
	pub fn end_line(&self) -> usize {
		self.start_line + self.lines.len()
	}

	pub fn len(&self) -> usize {
		self.lines.len()
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	/// The chunk's lines joined by newlines, as embedded in a prompt.
	pub fn text(&self) -> String {
		self.lines.join("\n")
	}
}

/// Partition of a line stream into ordered, non-overlapping chunks of at most `max_lines`.
///
/// Chunks borrow from the input, and `iter` can be called any number of times; each call
/// starts again from the first chunk.
#[derive(Clone, Copy, Debug)]
pub struct ChunkPlan<'a> {
	lines: &'a [String],
	max_lines: usize,
}
impl<'a> ChunkPlan<'a> {
	pub fn new(lines: &'a [String], cfg: &ChunkingConfig) -> Self {
		if cfg.max_lines == 0 {
			tracing::warn!("Chunk size of zero lines requested; using one line per chunk.");
		}

		Self { lines, max_lines: cfg.max_lines.max(1) }
	}

	/// Number of chunks, `ceil(lines / max_lines)`.
	pub fn len(&self) -> usize {
		self.lines.len().div_ceil(self.max_lines)
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	pub fn max_lines(&self) -> usize {
		self.max_lines
	}

	pub fn iter(&self) -> impl ExactSizeIterator<Item = Chunk<'a>> + 'a {
		let max_lines = self.max_lines;

		self.lines.chunks(max_lines).enumerate().map(move |(chunk_index, lines)| Chunk {
			chunk_index,
			start_line: chunk_index * max_lines,
			lines,
		})
	}
}

pub fn split_lines<'a>(lines: &'a [String], cfg: &ChunkingConfig) -> Vec<Chunk<'a>> {
	ChunkPlan::new(lines, cfg).iter().collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn lines(count: usize) -> Vec<String> {
		(0..count).map(|idx| format!("{{\"row\": {idx}}}")).collect()
	}

	#[test]
	fn chunk_counts_and_sizes_follow_the_bound() {
		for total in 0..=23 {
			let input = lines(total);

			for max_lines in 1..=7 {
				let cfg = ChunkingConfig { max_lines };
				let chunks = split_lines(&input, &cfg);

				assert_eq!(chunks.len(), total.div_ceil(max_lines));
				assert_eq!(ChunkPlan::new(&input, &cfg).len(), chunks.len());

				for (idx, chunk) in chunks.iter().enumerate() {
					assert_eq!(chunk.chunk_index, idx);

					if idx + 1 < chunks.len() {
						assert_eq!(chunk.len(), max_lines);
					} else {
						assert!(chunk.len() >= 1 && chunk.len() <= max_lines);
					}
				}

				let rebuilt: Vec<String> =
					chunks.iter().flat_map(|chunk| chunk.lines.iter().cloned()).collect();

				assert_eq!(rebuilt, input);
			}
		}
	}

	#[test]
	fn chunks_carry_line_offsets() {
		let input = lines(5);
		let chunks = split_lines(&input, &ChunkingConfig { max_lines: 2 });

		assert_eq!(
			chunks.iter().map(|chunk| (chunk.start_line, chunk.end_line())).collect::<Vec<_>>(),
			vec![(0, 2), (2, 4), (4, 5)]
		);
		assert_eq!(chunks[2].text(), "{\"row\": 4}");
		assert_eq!(chunks[0].text(), "{\"row\": 0}\n{\"row\": 1}");
	}

	#[test]
	fn iteration_restarts_from_the_first_chunk() {
		let input = lines(4);
		let plan = ChunkPlan::new(&input, &ChunkingConfig { max_lines: 3 });
		let first: Vec<Chunk<'_>> = plan.iter().collect();
		let second: Vec<Chunk<'_>> = plan.iter().collect();

		assert_eq!(first, second);
	}

	#[test]
	fn zero_bound_is_clamped() {
		let input = lines(3);
		let plan = ChunkPlan::new(&input, &ChunkingConfig { max_lines: 0 });

		assert_eq!(plan.max_lines(), 1);
		assert_eq!(plan.len(), 3);
	}

	#[test]
	fn default_bound_is_two_thousand_lines() {
		assert_eq!(ChunkingConfig::default().max_lines, 2_000);
	}
}
