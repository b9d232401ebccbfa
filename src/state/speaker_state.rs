//! Speaker queue structure and editing rules

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SpeakerError;

/// A queued speaker. The timer only reads `duration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: String,
    pub name: String,
    pub topic: String,
    /// Allotted time in seconds
    pub duration: i64,
}

/// Fields for a new speaker
#[derive(Debug, Clone, Deserialize)]
pub struct SpeakerInput {
    pub name: String,
    pub topic: String,
    pub duration: i64,
}

/// Partial edit; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeakerPatch {
    pub name: Option<String>,
    pub topic: Option<String>,
    pub duration: Option<i64>,
}

/// Ordered speaker list plus the active position
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerQueue {
    pub speakers: Vec<Speaker>,
    pub current_index: Option<usize>,
}

fn required(value: &str, err: SpeakerError) -> Result<String, SpeakerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(err)
    } else {
        Ok(trimmed.to_string())
    }
}

fn positive(duration: i64) -> Result<i64, SpeakerError> {
    if duration <= 0 {
        Err(SpeakerError::InvalidDuration(duration))
    } else {
        Ok(duration)
    }
}

impl SpeakerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    /// The speaker at the current index, if any
    pub fn current_speaker(&self) -> Option<&Speaker> {
        self.current_index.and_then(|i| self.speakers.get(i))
    }

    /// Validate and append a speaker
    pub fn add(&mut self, input: SpeakerInput) -> Result<Speaker, SpeakerError> {
        let speaker = Speaker {
            id: Uuid::new_v4().to_string(),
            name: required(&input.name, SpeakerError::NameRequired)?,
            topic: required(&input.topic, SpeakerError::TopicRequired)?,
            duration: positive(input.duration)?,
        };
        self.speakers.push(speaker.clone());
        Ok(speaker)
    }

    /// Apply a partial update to the speaker with `id`
    pub fn edit(&mut self, id: &str, patch: SpeakerPatch) -> Result<Speaker, SpeakerError> {
        let name = patch
            .name
            .as_deref()
            .map(|n| required(n, SpeakerError::NameRequired))
            .transpose()?;
        let topic = patch
            .topic
            .as_deref()
            .map(|t| required(t, SpeakerError::TopicRequired))
            .transpose()?;
        let duration = patch.duration.map(positive).transpose()?;

        let speaker = self
            .speakers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SpeakerError::NotFound(id.to_string()))?;

        if let Some(name) = name {
            speaker.name = name;
        }
        if let Some(topic) = topic {
            speaker.topic = topic;
        }
        if let Some(duration) = duration {
            speaker.duration = duration;
        }
        Ok(speaker.clone())
    }

    /// Remove a speaker, pulling the current index back into range
    pub fn delete(&mut self, id: &str) -> Result<Speaker, SpeakerError> {
        let position = self
            .speakers
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| SpeakerError::NotFound(id.to_string()))?;
        let removed = self.speakers.remove(position);

        if let Some(index) = self.current_index {
            if self.speakers.is_empty() {
                self.current_index = None;
            } else if index >= self.speakers.len() {
                self.current_index = Some(self.speakers.len() - 1);
            }
        }
        Ok(removed)
    }

    pub fn set_current(&mut self, index: Option<usize>) -> Result<(), SpeakerError> {
        if let Some(i) = index {
            if i >= self.speakers.len() {
                return Err(SpeakerError::IndexOutOfRange {
                    index: i,
                    len: self.speakers.len(),
                });
            }
        }
        self.current_index = index;
        Ok(())
    }

    /// Advance to the next speaker, wrapping at the end
    pub fn load_next(&mut self) -> Option<&Speaker> {
        if self.speakers.is_empty() {
            return None;
        }
        let next = match self.current_index {
            None => 0,
            Some(i) => (i + 1) % self.speakers.len(),
        };
        self.current_index = Some(next);
        self.speakers.get(next)
    }

    /// Move the speaker at `from` to position `to`, keeping the current
    /// index on the same speaker
    pub fn move_speaker(&mut self, from: usize, to: usize) -> Result<(), SpeakerError> {
        let len = self.speakers.len();
        for index in [from, to] {
            if index >= len {
                return Err(SpeakerError::IndexOutOfRange { index, len });
            }
        }

        let moved = self.speakers.remove(from);
        self.speakers.insert(to, moved);

        if let Some(current) = self.current_index {
            self.current_index = Some(if current == from {
                to
            } else if from < current && to >= current {
                current - 1
            } else if from > current && to <= current {
                current + 1
            } else {
                current
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, duration: i64) -> SpeakerInput {
        SpeakerInput {
            name: name.to_string(),
            topic: format!("{name}'s talk"),
            duration,
        }
    }

    fn queue_of(names: &[&str]) -> SpeakerQueue {
        let mut queue = SpeakerQueue::new();
        for name in names {
            queue.add(input(name, 60)).unwrap();
        }
        queue
    }

    fn names(queue: &SpeakerQueue) -> Vec<&str> {
        queue.speakers.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn add_validates_and_trims() {
        let mut queue = SpeakerQueue::new();
        assert_eq!(queue.add(input("  ", 60)), Err(SpeakerError::NameRequired));
        assert_eq!(
            queue.add(SpeakerInput {
                name: "Ada".into(),
                topic: "".into(),
                duration: 60
            }),
            Err(SpeakerError::TopicRequired)
        );
        assert_eq!(queue.add(input("Ada", 0)), Err(SpeakerError::InvalidDuration(0)));

        let speaker = queue.add(input("  Ada ", 300)).unwrap();
        assert_eq!(speaker.name, "Ada");
        assert_eq!(queue.len(), 1);
        assert!(!speaker.id.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let queue = queue_of(&["a", "b", "c"]);
        assert_ne!(queue.speakers[0].id, queue.speakers[1].id);
        assert_ne!(queue.speakers[1].id, queue.speakers[2].id);
    }

    #[test]
    fn edit_applies_only_supplied_fields() {
        let mut queue = queue_of(&["a"]);
        let id = queue.speakers[0].id.clone();

        let edited = queue
            .edit(
                &id,
                SpeakerPatch {
                    duration: Some(90),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(edited.name, "a");
        assert_eq!(edited.duration, 90);

        let rejected = queue.edit(
            &id,
            SpeakerPatch {
                duration: Some(-1),
                ..Default::default()
            },
        );
        assert_eq!(rejected, Err(SpeakerError::InvalidDuration(-1)));
        assert_eq!(queue.speakers[0].duration, 90);

        assert!(matches!(
            queue.edit("missing", SpeakerPatch::default()),
            Err(SpeakerError::NotFound(_))
        ));
    }

    #[test]
    fn delete_clamps_current_index() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_current(Some(2)).unwrap();

        let last = queue.speakers[2].id.clone();
        queue.delete(&last).unwrap();
        assert_eq!(queue.current_index, Some(1));

        let ids: Vec<String> = queue.speakers.iter().map(|s| s.id.clone()).collect();
        for id in ids {
            queue.delete(&id).unwrap();
        }
        assert_eq!(queue.current_index, None);
        assert!(queue.current_speaker().is_none());
    }

    #[test]
    fn load_next_wraps() {
        let mut queue = SpeakerQueue::new();
        assert!(queue.load_next().is_none());

        let mut queue = queue_of(&["a", "b"]);
        assert_eq!(queue.load_next().map(|s| s.name.as_str()), Some("a"));
        assert_eq!(queue.load_next().map(|s| s.name.as_str()), Some("b"));
        assert_eq!(queue.load_next().map(|s| s.name.as_str()), Some("a"));
    }

    #[test]
    fn set_current_checks_range() {
        let mut queue = queue_of(&["a"]);
        assert_eq!(
            queue.set_current(Some(1)),
            Err(SpeakerError::IndexOutOfRange { index: 1, len: 1 })
        );
        queue.set_current(Some(0)).unwrap();
        queue.set_current(None).unwrap();
        assert_eq!(queue.current_index, None);
    }

    #[test]
    fn move_keeps_current_speaker_selected() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);

        queue.set_current(Some(1)).unwrap();
        queue.move_speaker(1, 3).unwrap();
        assert_eq!(names(&queue), ["a", "c", "d", "b"]);
        assert_eq!(queue.current_speaker().unwrap().name, "b");

        queue.move_speaker(0, 3).unwrap();
        assert_eq!(names(&queue), ["c", "d", "b", "a"]);
        assert_eq!(queue.current_speaker().unwrap().name, "b");

        queue.move_speaker(3, 0).unwrap();
        assert_eq!(names(&queue), ["a", "c", "d", "b"]);
        assert_eq!(queue.current_speaker().unwrap().name, "b");

        assert!(queue.move_speaker(0, 4).is_err());
    }

    #[test]
    fn serializes_current_index_in_camel_case() {
        let mut queue = queue_of(&["a"]);
        queue.set_current(Some(0)).unwrap();
        let json = serde_json::to_value(&queue).unwrap();
        assert_eq!(json["currentIndex"], 0);
        assert_eq!(json["speakers"][0]["duration"], 60);
    }
}
