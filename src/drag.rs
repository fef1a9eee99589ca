// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drag behaviors for text fields.
//!
//! Each live field gets one [`DragHandle`], keyed by its [`FieldId`]. The
//! pool is torn down and rebuilt whenever the field id list, the background
//! generation, or the composition bounds change. Attribute edits (text,
//! font, color, size) leave the pool alone.
//!
//! While a drag is in progress the handle owns the live offset; the stored
//! position is only written back on release.

use crate::models::composition::Composition;
use crate::models::field::{FieldId, FieldUpdate, Position};

/// Size of the composition in image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Clamp a box of `extent` at `pos` so it stays inside the bounds. A box
    /// larger than the bounds is pinned to the origin on that axis.
    pub fn clamp(&self, pos: Position, extent: (f32, f32)) -> Position {
        let max_x = (self.width - extent.0).max(0.0);
        let max_y = (self.height - extent.1).max(0.0);
        Position::new(pos.x.clamp(0.0, max_x), pos.y.clamp(0.0, max_y))
    }
}

/// Outcome of an interaction with a handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    /// The field was pressed and should become active.
    Activated(FieldId),
    /// A drag finished at `position`.
    Moved { id: FieldId, position: Position },
}

/// Drag behavior attached to one field.
#[derive(Debug)]
pub struct DragHandle {
    field_id: FieldId,
    bounds: Bounds,
    origin: Position,
    offset: (f32, f32),
    dragging: bool,
}

impl DragHandle {
    fn attach(field_id: FieldId, origin: Position, bounds: Bounds) -> Self {
        Self {
            field_id,
            bounds,
            origin,
            offset: (0.0, 0.0),
            dragging: false,
        }
    }

    #[cfg(test)]
    pub fn field_id(&self) -> FieldId {
        self.field_id
    }

    fn current(&self) -> Position {
        Position::new(self.origin.x + self.offset.0, self.origin.y + self.offset.1)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SyncKey {
    ids: Vec<FieldId>,
    background_generation: u64,
    bounds: Bounds,
}

/// Pool of drag handles mirroring the composition's fields.
#[derive(Debug, Default)]
pub struct DragSync {
    handles: Vec<DragHandle>,
    key: Option<SyncKey>,
    released_total: u64,
}

impl DragSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the pool in line with the composition. Returns true if the
    /// handles were rebuilt.
    pub fn sync(&mut self, composition: &Composition, bounds: Bounds) -> bool {
        let key = SyncKey {
            ids: composition.fields().iter().map(|f| f.id).collect(),
            background_generation: composition.background_generation(),
            bounds,
        };
        if self.key.as_ref() == Some(&key) {
            return false;
        }

        self.teardown();
        self.handles = composition
            .fields()
            .iter()
            .map(|field| DragHandle::attach(field.id, field.position, bounds))
            .collect();
        self.key = Some(key);

        log::debug!("Attached {} drag handles", self.handles.len());
        true
    }

    /// Release every handle.
    pub fn teardown(&mut self) {
        self.released_total += self.handles.len() as u64;
        self.handles.clear();
        self.key = None;
    }

    pub fn attached(&self) -> usize {
        self.handles.len()
    }

    pub fn released_total(&self) -> u64 {
        self.released_total
    }

    #[cfg(test)]
    pub fn handles(&self) -> impl Iterator<Item = &DragHandle> {
        self.handles.iter()
    }

    fn handle_mut(&mut self, id: FieldId) -> Option<&mut DragHandle> {
        self.handles.iter_mut().find(|h| h.field_id == id)
    }

    /// Pointer down on a field. `origin` is the field's stored position at
    /// the moment of the press.
    pub fn press(&mut self, id: FieldId, origin: Position) -> Option<DragEvent> {
        let handle = self.handle_mut(id)?;
        handle.origin = origin;
        handle.offset = (0.0, 0.0);
        handle.dragging = true;
        Some(DragEvent::Activated(id))
    }

    /// Press plus the movement seen in the same frame the drag started, so the
    /// field does not trail the pointer by that first step.
    pub fn begin(
        &mut self,
        id: FieldId,
        origin: Position,
        delta: (f32, f32),
        extent: (f32, f32),
    ) -> Option<DragEvent> {
        let event = self.press(id, origin)?;
        self.drag(id, delta, extent);
        Some(event)
    }

    /// Move a pressed handle by `delta` image pixels. `extent` is the field's
    /// current rendered size, used for clamping.
    pub fn drag(&mut self, id: FieldId, delta: (f32, f32), extent: (f32, f32)) {
        let Some(handle) = self.handle_mut(id) else {
            return;
        };
        if !handle.dragging {
            return;
        }
        let proposed = Position::new(
            handle.origin.x + handle.offset.0 + delta.0,
            handle.origin.y + handle.offset.1 + delta.1,
        );
        let clamped = handle.bounds.clamp(proposed, extent);
        handle.offset = (clamped.x - handle.origin.x, clamped.y - handle.origin.y);
    }

    /// Pointer released. Yields the final position for the captured field.
    pub fn release(&mut self, id: FieldId) -> Option<DragEvent> {
        let handle = self.handle_mut(id)?;
        if !handle.dragging {
            return None;
        }
        let position = handle.current();
        handle.origin = position;
        handle.offset = (0.0, 0.0);
        handle.dragging = false;
        Some(DragEvent::Moved { id, position })
    }

    /// Position to draw a field at: the live drag position while dragging.
    pub fn live_position(&self, id: FieldId) -> Option<Position> {
        self.handles
            .iter()
            .find(|h| h.field_id == id && h.dragging)
            .map(DragHandle::current)
    }

    /// Write an event back into the composition.
    pub fn apply(event: DragEvent, composition: &mut Composition) {
        match event {
            DragEvent::Activated(id) => composition.set_active(Some(id)),
            DragEvent::Moved { id, position } => {
                composition.update_field(id, FieldUpdate::Position(position));
                log::info!("Moved {:?} to ({:.1}, {:.1})", id, position.x, position.y);
            }
        }
    }
}

impl Drop for DragSync {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::composition::BackgroundSource;
    use crate::models::field::{FieldDefaults, FieldUpdate, Rgb};

    const BOUNDS: Bounds = Bounds {
        width: 500.0,
        height: 400.0,
    };

    fn seeded() -> Composition {
        Composition::with_seed_fields(BackgroundSource::Remote("bg".into()))
    }

    #[test]
    fn test_one_handle_per_field_in_order() {
        let mut composition = seeded();
        let mut sync = DragSync::new();
        assert!(sync.sync(&composition, BOUNDS));

        composition.add_field(FieldDefaults::default());
        assert!(sync.sync(&composition, BOUNDS));

        let handle_ids: Vec<_> = sync.handles().map(DragHandle::field_id).collect();
        let field_ids: Vec<_> = composition.fields().iter().map(|f| f.id).collect();
        assert_eq!(handle_ids, field_ids);
    }

    #[test]
    fn test_no_leaks_across_add_remove_cycles() {
        let mut composition = seeded();
        let mut sync = DragSync::new();
        sync.sync(&composition, BOUNDS);

        for _ in 0..10 {
            let id = composition.add_field(FieldDefaults::default());
            sync.sync(&composition, BOUNDS);
            assert_eq!(sync.attached(), composition.len());

            composition.remove_field(id);
            sync.sync(&composition, BOUNDS);
            assert_eq!(sync.attached(), composition.len());
        }

        // Every handle ever attached is either live or released.
        let attached_total: u64 = 2 + 10 * (3 + 2);
        assert_eq!(sync.released_total() + sync.attached() as u64, attached_total);

        // One handle per field, so a press fires exactly one event.
        let first = composition.fields()[0].id;
        assert_eq!(sync.handles().filter(|h| h.field_id() == first).count(), 1);
        let events: Vec<_> = sync.press(first, Position::default()).into_iter().collect();
        assert_eq!(events, vec![DragEvent::Activated(first)]);
    }

    #[test]
    fn test_attribute_edits_do_not_rebuild() {
        let mut composition = seeded();
        let mut sync = DragSync::new();
        sync.sync(&composition, BOUNDS);
        let id = composition.fields()[0].id;

        composition.update_field(id, FieldUpdate::Text("hello".into()));
        composition.update_field(id, FieldUpdate::Color(Rgb::BLACK));
        composition.update_field(id, FieldUpdate::Size(90));
        assert!(!sync.sync(&composition, BOUNDS));
        assert_eq!(sync.released_total(), 0);
    }

    #[test]
    fn test_background_change_rebuilds() {
        let mut composition = seeded();
        let mut sync = DragSync::new();
        sync.sync(&composition, BOUNDS);

        composition.set_background(BackgroundSource::Remote("other".into()));
        assert!(sync.sync(&composition, BOUNDS));
        assert_eq!(sync.released_total(), 2);
    }

    #[test]
    fn test_swapping_a_field_without_count_change_rebuilds() {
        let mut composition = seeded();
        let mut sync = DragSync::new();
        sync.sync(&composition, BOUNDS);

        let first = composition.fields()[0].id;
        composition.remove_field(first);
        composition.add_field(FieldDefaults::default());
        assert!(sync.sync(&composition, BOUNDS));
        assert!(sync.handles().all(|h| h.field_id() != first));
    }

    #[test]
    fn test_release_moves_only_the_dragged_field() {
        let mut composition = seeded();
        let mut sync = DragSync::new();
        sync.sync(&composition, BOUNDS);

        let dragged = composition.fields()[1].clone();
        let untouched = composition.fields()[0].clone();

        let event = sync.press(dragged.id, dragged.position).unwrap();
        DragSync::apply(event, &mut composition);
        assert_eq!(composition.active(), Some(dragged.id));

        sync.drag(dragged.id, (10.0, -15.0), (100.0, 40.0));
        assert_eq!(
            sync.live_position(dragged.id),
            Some(Position::new(dragged.position.x + 10.0, dragged.position.y - 15.0))
        );
        // Store is not written until release.
        assert_eq!(composition.field(dragged.id).unwrap().position, dragged.position);

        let event = sync.release(dragged.id).unwrap();
        DragSync::apply(event, &mut composition);

        assert_eq!(
            composition.field(dragged.id).unwrap().position,
            Position::new(dragged.position.x + 10.0, dragged.position.y - 15.0)
        );
        assert_eq!(composition.field(untouched.id).unwrap(), &untouched);
        assert_eq!(sync.live_position(dragged.id), None);
    }

    #[test]
    fn test_drag_is_clamped_to_bounds() {
        let composition = seeded();
        let mut sync = DragSync::new();
        sync.sync(&composition, BOUNDS);
        let id = composition.fields()[0].id;

        sync.press(id, Position::new(50.0, 20.0));
        sync.drag(id, (-500.0, -500.0), (100.0, 40.0));
        assert_eq!(sync.live_position(id), Some(Position::new(0.0, 0.0)));

        sync.drag(id, (10_000.0, 10_000.0), (100.0, 40.0));
        assert_eq!(sync.live_position(id), Some(Position::new(400.0, 360.0)));
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let composition = seeded();
        let mut sync = DragSync::new();
        sync.sync(&composition, BOUNDS);
        let id = composition.fields()[0].id;

        assert_eq!(sync.release(id), None);
        assert_eq!(sync.press(FieldId(999), Position::default()), None);
    }

    #[test]
    fn test_first_frame_of_movement_is_kept() {
        let mut composition = seeded();
        let mut sync = DragSync::new();
        sync.sync(&composition, BOUNDS);
        let field = composition.fields()[0].clone();

        let event = sync
            .begin(field.id, field.position, (7.0, 3.0), (100.0, 40.0))
            .unwrap();
        assert_eq!(event, DragEvent::Activated(field.id));
        sync.drag(field.id, (5.0, 5.0), (100.0, 40.0));

        let event = sync.release(field.id).unwrap();
        DragSync::apply(event, &mut composition);
        assert_eq!(
            composition.field(field.id).unwrap().position,
            Position::new(field.position.x + 12.0, field.position.y + 8.0)
        );
        assert_eq!(sync.begin(FieldId(999), Position::default(), (1.0, 1.0), (1.0, 1.0)), None);
    }
}
