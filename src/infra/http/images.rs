//! Allow-list gate for sandbox image names.

/// Configured set of compile-sandbox images requests may name. An empty
/// list disables the gate entirely; an absent image name always passes,
/// letting the engine pick its default.
#[derive(Debug, Clone, Default)]
pub struct AllowedImages {
    allowed: Vec<String>,
}

impl AllowedImages {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    pub fn permits(&self, image_name: Option<&str>) -> bool {
        match image_name {
            None => true,
            Some(_) if self.allowed.is_empty() => true,
            Some(image) => self.allowed.iter().any(|allowed| allowed == image),
        }
    }
}
