/// Three-phase batching driver
///
/// Converts a population count, the alignment distance of the data pointer,
/// and a lane width into three non-overlapping index ranges:
///
/// - prologue `[0, prologue)` — scalar, walks up to the first aligned address
/// - body `[prologue, prologue + body_chunks * lanes)` — full-width chunks
/// - epilogue `[.., population)` — scalar remainder
///
/// The ranges always partition `[0, population)` exactly; an input shorter
/// than one vector routes entirely through the scalar phases. Every kernel
/// consumes the same plan and differs only in its per-phase work.
use crate::columnar::Alignment;
use crate::simd::ProcessingStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    /// Scalar prologue element count.
    pub prologue: usize,
    /// Number of full-width chunks in the vector body.
    pub body_chunks: usize,
    /// Lane width of the body chunks.
    pub lanes: usize,
    /// Scalar epilogue element count.
    pub epilogue: usize,
}

impl BatchPlan {
    /// Partition `population` elements given the element distance to the
    /// next aligned address.
    pub fn compute(population: usize, elements_until_alignment: usize, lanes: usize) -> Self {
        debug_assert!(lanes >= 1);
        let prologue = population.min(elements_until_alignment);
        let body_chunks = (population - prologue) / lanes;
        let epilogue = population - prologue - body_chunks * lanes;
        Self {
            prologue,
            body_chunks,
            lanes,
            epilogue,
        }
    }

    /// Plan for `data` processed at style `S`, aligning the body phase to
    /// the style's register width.
    pub fn for_style<S: ProcessingStyle>(data: &[S::Elem]) -> Self {
        let alignment = Alignment::analyze(data.as_ptr(), S::vector_size_bytes());
        Self::compute(
            data.len(),
            alignment.elements_until_alignment::<S::Elem>(),
            S::LANES,
        )
    }

    /// First body element index.
    pub fn body_start(&self) -> usize {
        self.prologue
    }

    /// Body length in elements.
    pub fn body_len(&self) -> usize {
        self.body_chunks * self.lanes
    }

    /// First epilogue element index.
    pub fn epilogue_start(&self) -> usize {
        self.prologue + self.body_len()
    }

    /// Total element count covered by the three phases.
    pub fn total(&self) -> usize {
        self.prologue + self.body_len() + self.epilogue
    }
}
