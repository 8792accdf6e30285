/// A parsed MQTT-style topic pattern.
///
/// Levels are separated by `/`:
/// - `+` matches exactly one level
/// - `#` matches zero or more remaining levels (only valid last)
///
/// The status board registers a handful of handlers and subscribers per
/// screen, so patterns are matched linearly instead of through a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPattern {
    raw: String,
    levels: Vec<Level>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Level {
    Exact(String),
    One,
    Rest,
}

impl TopicPattern {
    /// Parse a pattern. A `#` anywhere but the last level is treated as
    /// the end of the pattern, matching everything below it.
    pub fn parse(pattern: &str) -> Self {
        let mut levels = Vec::new();
        if !pattern.is_empty() {
            for segment in pattern.split('/') {
                match segment {
                    "#" => {
                        levels.push(Level::Rest);
                        break;
                    }
                    "+" => levels.push(Level::One),
                    other => levels.push(Level::Exact(other.to_string())),
                }
            }
        }
        Self {
            raw: pattern.to_string(),
            levels,
        }
    }

    /// The pattern text as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if the pattern has no wildcard levels.
    pub fn is_exact(&self) -> bool {
        self.levels.iter().all(|l| matches!(l, Level::Exact(_)))
    }

    /// Check whether a concrete topic path matches this pattern.
    pub fn matches(&self, topic: &str) -> bool {
        let segments: Vec<&str> = if topic.is_empty() {
            Vec::new()
        } else {
            topic.split('/').collect()
        };

        let mut i = 0;
        for level in &self.levels {
            match level {
                Level::Rest => return true,
                Level::One => {
                    if i >= segments.len() {
                        return false;
                    }
                }
                Level::Exact(expected) => {
                    if segments.get(i) != Some(&expected.as_str()) {
                        return false;
                    }
                }
            }
            i += 1;
        }
        i == segments.len()
    }
}
