//! Movie clip records and the keyframe delta codec.
//!
//! Each depth timeline is written as a run of frames where only fields
//! that differ from the previous frame of the same timeline are stored.
//! A change byte says which fields follow:
//!
//! ```text
//! bit 0  uid            VL u32
//! bit 1  name           VL pool index
//! bit 2  color          sub-mask + 1 byte per set channel
//! bit 3  matrix         sub-mask + signed VL per set component
//! bit 4  clip depth     i16 LE
//! bit 5  ratio          1 byte
//! bit 6  alpha only     1 byte (mA), replaces the color sub-mask
//! ```
//!
//! Payload order is uid, clip depth, name, color, matrix, ratio.
//!
//! Sub-timelines carry no timeline count: every one holds exactly the
//! clip's `total_depths` timelines.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use super::{EncodeContext, OArchive};
use crate::container::format::*;
use crate::container::quantize;
use crate::model::{Action, Frame, MovieClipSymbol, SubTimeline, Timeline, NO_CLIP_DEPTH, NO_UID};
use crate::util::{affine_components, ByAddress, ColorTransform, DAffine2, Error, Result};

/// Last written value of every animated field of one timeline.
///
/// Holds the frame's true values, never the quantized ones, so rounding
/// does not accumulate across a run of frames.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameState {
    pub uid: i32,
    pub name: Option<String>,
    pub color_transform: ColorTransform,
    pub transform: DAffine2,
    pub clip_depth: i32,
    pub ratio: f64,
}

impl Default for FrameState {
    /// State at the start of every timeline.
    fn default() -> Self {
        Self {
            uid: NO_UID,
            name: None,
            color_transform: ColorTransform::NEUTRAL,
            transform: DAffine2::IDENTITY,
            clip_depth: NO_CLIP_DEPTH,
            ratio: 0.0,
        }
    }
}

impl FrameState {
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            uid: frame.uid,
            name: frame.name.clone(),
            color_transform: frame.color_transform,
            transform: frame.transform,
            clip_depth: frame.clip_depth,
            ratio: frame.ratio,
        }
    }
}

/// Which fields of a frame differ from the tracked state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameChanges {
    pub uid: bool,
    pub name: bool,
    pub color_transform: bool,
    pub matrix: bool,
    pub clip_depth: bool,
    pub ratio: bool,
    /// Only the alpha multiplier changed.
    pub alpha: bool,
    /// Per channel: mR, mG, mB, mA, aR, aG, aB, aA.
    pub color_fields: [bool; 8],
    /// Per component: a, b, c, d, tx, ty.
    pub matrix_fields: [bool; 6],
}

impl FrameChanges {
    pub fn between(last: &FrameState, frame: &Frame) -> Self {
        let (lm, la) = (last.color_transform.multipliers(), last.color_transform.offsets());
        let (fm, fa) = (frame.color_transform.multipliers(), frame.color_transform.offsets());

        let mut color_fields = [false; 8];
        for i in 0..4 {
            color_fields[i] = fm[i] != lm[i];
            color_fields[4 + i] = fa[i] != la[i];
        }
        let alpha = color_fields == [false, false, false, true, false, false, false, false];

        let lc = affine_components(&last.transform);
        let fc = affine_components(&frame.transform);
        let mut matrix_fields = [false; 6];
        for i in 0..6 {
            matrix_fields[i] = fc[i] != lc[i];
        }

        Self {
            uid: frame.uid != last.uid,
            name: frame.name != last.name,
            color_transform: frame.color_transform != last.color_transform,
            matrix: frame.transform != last.transform,
            clip_depth: frame.clip_depth != last.clip_depth,
            ratio: frame.ratio != last.ratio,
            alpha,
            color_fields,
            matrix_fields,
        }
    }

    /// The per-frame change byte.
    pub fn mask(&self) -> u8 {
        pack_flags(&[
            (self.uid, FRAME_UID),
            (self.name, FRAME_NAME),
            (self.color_transform, FRAME_COLOR_TRANSFORM),
            (self.matrix, FRAME_MATRIX),
            (self.clip_depth, FRAME_CLIP_DEPTH),
            (self.ratio, FRAME_RATIO),
            (self.alpha, FRAME_ALPHA),
        ])
    }
}

impl<W: Write> OArchive<W> {
    pub(super) fn write_movie_clip(&mut self, ctx: &EncodeContext<'_, '_>, clip: &MovieClipSymbol) -> Result<()> {
        self.stream
            .write_u8(pack_flags(&[(clip.nine_patch.is_some(), CLIP_FLAG_NINE_PATCH)]))?;

        let limits = &clip.limits;
        self.stream.write_u_vl(limits.total_depths)?;
        self.stream.write_u_vl(limits.total_frames)?;
        self.stream.write_u_vl(limits.total_time)?;

        self.stream.write_len_vl(clip.uid_info.len())?;
        for info in &clip.uid_info {
            self.stream.write_u_vl(info.character_id)?;
            if info.extra_props.is_empty() {
                self.stream.write_string_vl("")?;
            } else {
                self.stream.write_string_vl(&serde_json::to_string(&info.extra_props)?)?;
            }
        }

        if let Some(rect) = &clip.nine_patch {
            self.write_rect(rect)?;
        }

        // Distinct sub-timelines by instance, first-seen over the states.
        let mut distinct: Vec<&Arc<SubTimeline>> = Vec::new();
        let mut index_of: HashMap<ByAddress<'_, SubTimeline>, u32> = HashMap::new();
        for state in &clip.states {
            index_of.entry(ByAddress(&state.sub_timeline)).or_insert_with(|| {
                distinct.push(&state.sub_timeline);
                (distinct.len() - 1) as u32
            });
        }

        self.stream.write_len_vl(distinct.len())?;
        for sub_timeline in &distinct {
            self.write_sub_timeline(ctx, sub_timeline, limits.total_depths)?;
        }

        self.stream.write_len_vl(clip.states.len())?;
        for state in &clip.states {
            let index = index_of
                .get(&ByAddress(&state.sub_timeline))
                .copied()
                .ok_or_else(|| Error::SubTimelineNotRegistered(state.name.clone()))?;
            self.stream.write_u_vl(ctx.strings.lookup(Some(&state.name))?)?;
            self.stream.write_u_vl(state.start_time)?;
            self.stream.write_u_vl(index)?;
        }
        Ok(())
    }

    /// Sub-timeline record. Exactly `depths` timelines are written, so
    /// missing trailing depths go out as empty timelines.
    fn write_sub_timeline(&mut self, ctx: &EncodeContext<'_, '_>, st: &SubTimeline, depths: u32) -> Result<()> {
        if st.timelines.len() > depths as usize {
            return Err(Error::invalid(format!(
                "sub-timeline has {} depth timelines but the clip declares {}",
                st.timelines.len(),
                depths
            )));
        }
        self.stats.sub_timelines += 1;
        self.stream.write_u_vl(st.total_time)?;
        self.stream
            .write_u8(pack_flags(&[(st.next_state_play, SUB_TIMELINE_FLAG_NEXT_STATE_PLAY)]))?;
        self.stream.write_u_vl(ctx.strings.lookup(st.next_state.as_deref())?)?;

        self.stream.write_len_vl(st.actions.len())?;
        for (&time, actions) in &st.actions {
            self.stream.write_u_vl(time)?;
            self.stream.write_len_vl(actions.len())?;
            for action in actions {
                match action {
                    Action::PlaySound { sound_id } => {
                        self.stream.write_u8(ACTION_PLAY_SOUND)?;
                        self.stream.write_u_vl(ctx.assets.sound_id(*sound_id)?)?;
                    }
                }
            }
        }

        for timeline in &st.timelines {
            self.write_timeline(ctx, timeline)?;
        }
        for _ in st.timelines.len()..depths as usize {
            self.stream.write_len_vl(0)?;
        }
        Ok(())
    }

    fn write_timeline(&mut self, ctx: &EncodeContext<'_, '_>, timeline: &Timeline) -> Result<()> {
        self.stats.timelines += 1;
        self.stream.write_len_vl(timeline.frames.len())?;

        let mut state = FrameState::default();
        for frame in &timeline.frames {
            state = self.write_frame(ctx, &state, frame)?;
        }
        Ok(())
    }

    /// Write one frame against `last` and return the state for the next one.
    pub(super) fn write_frame(
        &mut self,
        ctx: &EncodeContext<'_, '_>,
        last: &FrameState,
        frame: &Frame,
    ) -> Result<FrameState> {
        self.stats.frames += 1;
        self.stream.write_u_vl(frame.time)?;

        let changes = FrameChanges::between(last, frame);
        self.stream.write_u8(changes.mask())?;

        if changes.uid {
            // -1 goes out as 0xFFFF_FFFF
            self.stream.write_u_vl(frame.uid as u32)?;
        }
        if changes.clip_depth {
            self.stream.write_i16(quantize::clip_depth(frame.clip_depth)?)?;
        }
        if changes.name {
            self.stream.write_u_vl(ctx.strings.lookup(frame.name.as_deref())?)?;
        }

        let ct = &frame.color_transform;
        if changes.alpha {
            self.stream.write_u8(quantize::color_multiplier(ct.m_a))?;
        } else if changes.color_transform {
            self.stream.write_u8(pack_bits(&changes.color_fields))?;
            let (m, a) = (ct.multipliers(), ct.offsets());
            for i in (0..8).filter(|&i| changes.color_fields[i]) {
                if i < 4 {
                    self.stream.write_u8(quantize::color_multiplier(m[i]))?;
                } else {
                    self.stream.write_i8(quantize::color_offset(a[i - 4]))?;
                }
            }
        }

        if changes.matrix {
            self.stream.write_u8(pack_bits(&changes.matrix_fields))?;
            let c = affine_components(&frame.transform);
            for i in (0..6).filter(|&i| changes.matrix_fields[i]) {
                let v = if i < 4 {
                    quantize::matrix_linear(c[i])?
                } else {
                    quantize::matrix_translation(c[i])?
                };
                self.stream.write_s_vl(v)?;
            }
        }

        if changes.ratio {
            self.stream.write_u8(quantize::ratio(frame.ratio))?;
        }

        Ok(FrameState::from_frame(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::DVec2;

    #[test]
    fn test_first_frame_against_baseline() {
        let frame = Frame::new(0, 1).with_clip_depth(5);
        let changes = FrameChanges::between(&FrameState::default(), &frame);
        assert!(changes.uid);
        assert!(changes.clip_depth);
        assert!(!changes.name);
        assert!(!changes.matrix);
        assert!(!changes.color_transform);
        assert!(!changes.ratio);
        assert_eq!(changes.mask(), 0b0001_0001);
    }

    #[test]
    fn test_alpha_only_change() {
        let last = FrameState::from_frame(&Frame::new(0, 1));
        let frame = Frame::new(100, 1).with_color_transform(ColorTransform::alpha(0.5));
        let changes = FrameChanges::between(&last, &frame);
        assert!(changes.alpha);
        assert!(changes.color_transform);
        assert_eq!(changes.mask(), (1u8 << FRAME_ALPHA) | (1 << FRAME_COLOR_TRANSFORM));
    }

    #[test]
    fn test_alpha_plus_other_channel_is_not_shortcut() {
        let last = FrameState::from_frame(&Frame::new(0, 1));
        let mut ct = ColorTransform::alpha(0.5);
        ct.a_r = 10;
        let frame = Frame::new(100, 1).with_color_transform(ct);
        let changes = FrameChanges::between(&last, &frame);
        assert!(!changes.alpha);
        assert!(changes.color_transform);
        assert_eq!(pack_bits(&changes.color_fields), 0b0001_1000);
    }

    #[test]
    fn test_matrix_fields() {
        let last = FrameState::from_frame(&Frame::new(0, 1));
        let frame = Frame::new(100, 1).with_transform(DAffine2::from_translation(DVec2::new(10.0, 0.0)));
        let changes = FrameChanges::between(&last, &frame);
        assert!(changes.matrix);
        assert_eq!(changes.mask(), 1u8 << FRAME_MATRIX);
        assert_eq!(pack_bits(&changes.matrix_fields), 1u8 << 4);
    }

    #[test]
    fn test_unchanged_frame_has_empty_mask() {
        let frame = Frame::new(0, 2).with_name("arm").with_ratio(0.25);
        let last = FrameState::from_frame(&frame);
        let next = Frame { time: 50, ..frame };
        assert_eq!(FrameChanges::between(&last, &next), FrameChanges::default());
    }
}
