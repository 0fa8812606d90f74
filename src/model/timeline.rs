//! Movie clip timelines: sub-timelines, per-depth frame runs, actions.

use std::collections::BTreeMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::util::{ColorTransform, DAffine2};

/// Sentinel uid for a frame that places no instance.
pub const NO_UID: i32 = -1;

/// Sentinel clip depth for a frame that is not a mask.
pub const NO_CLIP_DEPTH: i32 = -1;

/// One keyframe of a depth layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Time in milliseconds from the start of the sub-timeline.
    pub time: u32,
    /// Index into the owning clip's uid table, [`NO_UID`] for none.
    pub uid: i32,
    /// Instance name, if any.
    pub name: Option<String>,
    pub color_transform: ColorTransform,
    pub transform: DAffine2,
    /// Depth up to which this instance masks, [`NO_CLIP_DEPTH`] for none.
    pub clip_depth: i32,
    /// Morph ratio in `[0, 1]`.
    pub ratio: f64,
}

impl Frame {
    /// Frame at `time` placing `uid` with neutral state.
    pub fn new(time: u32, uid: i32) -> Self {
        Self {
            time,
            uid,
            name: None,
            color_transform: ColorTransform::NEUTRAL,
            transform: DAffine2::IDENTITY,
            clip_depth: NO_CLIP_DEPTH,
            ratio: 0.0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_color_transform(mut self, ct: ColorTransform) -> Self {
        self.color_transform = ct;
        self
    }

    pub fn with_transform(mut self, m: DAffine2) -> Self {
        self.transform = m;
        self
    }

    pub fn with_clip_depth(mut self, depth: i32) -> Self {
        self.clip_depth = depth;
        self
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }
}

/// Frame sequence of a single depth, ordered by time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    pub frames: Vec<Frame>,
}

impl Timeline {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }
}

/// Trigger executed when playback crosses a timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Play the sound symbol with this id.
    PlaySound { sound_id: u32 },
}

/// Actions keyed by timestamp.
pub type ActionList = SmallVec<[Action; 1]>;

/// A segment of per-depth animation, possibly shared by several states.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubTimeline {
    /// Duration in milliseconds.
    pub total_time: u32,
    /// State to go to after this one ends.
    pub next_state: Option<String>,
    /// Whether the next state starts playing automatically.
    pub next_state_play: bool,
    pub actions: BTreeMap<u32, ActionList>,
    /// One timeline per depth.
    pub timelines: Vec<Timeline>,
}

impl SubTimeline {
    pub fn new(total_time: u32) -> Self {
        Self { total_time, ..Self::default() }
    }

    /// Append an action at `time`.
    pub fn add_action(&mut self, time: u32, action: Action) {
        self.actions.entry(time).or_default().push(action);
    }

    /// Number of frames across all depths.
    pub fn frame_count(&self) -> usize {
        self.timelines.iter().map(|t| t.frames.len()).sum()
    }
}

/// A named playback state of a movie clip.
#[derive(Clone, Debug)]
pub struct NamedState {
    pub name: String,
    /// Shared by identity: two states may point at the same sub-timeline.
    pub sub_timeline: Arc<SubTimeline>,
    /// Offset in milliseconds into the sub-timeline.
    pub start_time: u32,
}

impl NamedState {
    pub fn new(name: impl Into<String>, sub_timeline: Arc<SubTimeline>, start_time: u32) -> Self {
        Self { name: name.into(), sub_timeline, start_time }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_defaults() {
        let f = Frame::new(0, 3);
        assert_eq!(f.uid, 3);
        assert_eq!(f.clip_depth, NO_CLIP_DEPTH);
        assert_eq!(f.transform, DAffine2::IDENTITY);
        assert_eq!(f.color_transform, ColorTransform::NEUTRAL);
        assert!(f.name.is_none());
    }

    #[test]
    fn test_sub_timeline_actions_group_by_time() {
        let mut st = SubTimeline::new(1000);
        st.add_action(500, Action::PlaySound { sound_id: 1 });
        st.add_action(500, Action::PlaySound { sound_id: 2 });
        st.add_action(0, Action::PlaySound { sound_id: 3 });

        assert_eq!(st.actions.len(), 2);
        assert_eq!(st.actions[&500].len(), 2);
        assert_eq!(st.actions.keys().copied().collect::<Vec<_>>(), vec![0, 500]);
    }
}
