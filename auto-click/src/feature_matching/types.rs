// Feature matching data types

/// Size of a binary descriptor in bytes (256 bits).
pub const DESCRIPTOR_BYTES: usize = 32;

/// BRIEF-style binary descriptor, compared by Hamming distance.
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// A detected corner in image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// FAST corner score, higher is stronger
    pub score: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, score: f32) -> Self {
        Self { x, y, score }
    }
}

/// Keypoints with their index-aligned descriptors.
///
/// Both vectors only grow together through [`FeatureSet::push`], so
/// `keypoints().len() == descriptors().len()` always holds.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, keypoint: Keypoint, descriptor: Descriptor) {
        self.keypoints.push(keypoint);
        self.descriptors.push(descriptor);
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn keypoint(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }
}

impl FromIterator<(Keypoint, Descriptor)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (Keypoint, Descriptor)>>(iter: I) -> Self {
        let mut set = FeatureSet::new();
        for (keypoint, descriptor) in iter {
            set.push(keypoint, descriptor);
        }
        set
    }
}

/// Number of differing bits between two descriptors
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// A candidate pairing of a template keypoint with a frame keypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correspondence {
    pub template_index: usize,
    pub frame_index: usize,
    /// Hamming distance between the two descriptors
    pub distance: u32,
}

/// Where a template was found in a frame, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalizationResult {
    pub found: bool,
    pub top_left_x: i32,
    pub top_left_y: i32,
    /// Match strength used by the decision policy; always 0 when not found
    pub confidence: f32,
    /// Correspondences that survived the ratio test
    pub correspondences: usize,
    /// Correspondences consistent with the fitted homography
    pub inliers: usize,
}

impl LocalizationResult {
    pub fn not_found(correspondences: usize) -> Self {
        Self {
            found: false,
            top_left_x: 0,
            top_left_y: 0,
            confidence: 0.0,
            correspondences,
            inliers: 0,
        }
    }
}
