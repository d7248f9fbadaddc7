//! Headless editor session.
//!
//! [`Editor`] owns everything one open image needs: the pins, the viewport,
//! the interaction mode, the gesture in progress, the comment editor and the
//! share popup. The host forwards pointer and keyboard events to it and
//! renders from its read-only queries. Nothing here touches a global.
//!
//! Pointer positions are in container coordinates (pixels relative to the
//! top-left of the element that holds the image layer).

use crate::coords::{fit_within, Percent, Point, Size};
use crate::error::CoreError;
use crate::gesture::{DragTracker, PointerKind, PressOutcome};
use crate::mode::{EditMode, Mode};
use crate::pins::{Annotation, PinColor, PinId, PinStore, TextCommit};
use crate::probe::ImageSource;
use crate::share::{
    share_url, ShareCreated, ShareFlow, SharePayload, ShareTicket, SHARE_NO_IMAGE_MESSAGE,
};
use crate::viewport::{Transition, Viewport};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum gap between a comment bubble and the container's right edge.
pub const BUBBLE_MARGIN_PX: f64 = 10.0;

// ---------------------------------------------------------------------------
// Event and outcome types
// ---------------------------------------------------------------------------

/// What the pointer went down on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    /// The image or the empty layer above it.
    Canvas,
    Pin(PinId),
    /// The comment bubble attached to a pin.
    Comment(PinId),
}

/// What a pointer event did.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerOutcome {
    Ignored,
    PinCreated(PinId),
    ZoomedToPin(PinId),
    /// The active pin was clicked after panning away from it.
    Recentered(PinId),
    ZoomedOut(Option<Transition>),
    EditorOpened(PinId),
    Panned(Point),
    PinDragged { pin: PinId, position: Percent },
    /// A pin drag ended. The view zooms out afterwards.
    PinDropped {
        pin: PinId,
        position: Percent,
        transition: Option<Transition>,
    },
}

/// How a comment edit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOutcome {
    Saved,
    /// Escape restored the text from before the edit.
    Reverted,
    /// The text was blank, so the pin was removed.
    Deleted,
}

/// Which side of its pin a comment bubble opens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleSide {
    Left,
    Right,
}

/// A share request the host should send to the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRequest {
    pub ticket: ShareTicket,
    pub payload: SharePayload,
}

/// The comment editor currently open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEditor {
    pub pin: PinId,
    /// Text the pin had when editing began; Escape restores it.
    pub original_text: String,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Canvas {
    source: ImageSource,
    viewport: Viewport,
}

/// At most one gesture is in progress at a time.
#[derive(Debug, Clone)]
enum Gesture {
    Pan(DragTracker),
    PinDrag {
        pin: PinId,
        origin: Percent,
        tracker: DragTracker,
    },
    Press {
        target: PointerTarget,
        tracker: DragTracker,
    },
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Editor {
    container: Size,
    canvas: Option<Canvas>,
    pins: PinStore,
    mode: EditMode,
    pin_color: PinColor,
    gesture: Option<Gesture>,
    has_panned: bool,
    open_bubble: Option<PinId>,
    editing: Option<CommentEditor>,
    share: ShareFlow,
    view_only: bool,
    pending_transition: Option<Transition>,
}

impl Editor {
    /// An empty editable session with no image loaded.
    pub fn new(container: Size) -> Result<Self, CoreError> {
        container.validate("container")?;
        Ok(Self {
            container,
            canvas: None,
            pins: PinStore::new(),
            mode: EditMode::default(),
            pin_color: PinColor::default(),
            gesture: None,
            has_panned: false,
            open_bubble: None,
            editing: None,
            share: ShareFlow::new(),
            view_only: false,
            pending_transition: None,
        })
    }

    /// A read-only session showing a loaded share whose image is a data URI.
    pub fn view_share(container: Size, payload: SharePayload) -> Result<Self, CoreError> {
        Self::view_share_measured(container, payload, None)
    }

    /// Like [`Editor::view_share`], but a URL or blob image is accepted when
    /// the host supplies the size it measured.
    pub fn view_share_measured(
        container: Size,
        payload: SharePayload,
        image_size: Option<Size>,
    ) -> Result<Self, CoreError> {
        let source = ImageSource::from_reference(&payload.image, image_size)?;
        Self::view_only(container, source, payload.annotations)
    }

    /// A read-only session for an image the host has already probed.
    pub fn view_only(
        container: Size,
        source: ImageSource,
        annotations: Vec<Annotation>,
    ) -> Result<Self, CoreError> {
        let mut editor = Self::new(container)?;
        editor.install_image(source)?;
        editor.pins.load(annotations)?;
        editor.view_only = true;
        Ok(editor)
    }

    // -- Image lifecycle ----------------------------------------------------

    /// Decode and show an uploaded `data:` URI. On failure nothing changes.
    pub fn load_image_uri(&mut self, uri: &str) -> Result<(), CoreError> {
        let source = ImageSource::from_data_uri(uri)?;
        self.load_image(source)
    }

    /// Show a new image. Existing pins are discarded.
    pub fn load_image(&mut self, source: ImageSource) -> Result<(), CoreError> {
        self.ensure_editable()?;
        self.install_image(source)?;
        self.pins.clear();
        Ok(())
    }

    /// Back to the landing state: no image, no pins, nothing open.
    pub fn reset(&mut self) {
        self.canvas = None;
        self.pins.clear();
        self.clear_transient_state();
        self.share.close();
    }

    /// The container was resized; refit the image and re-clamp the view.
    pub fn resize(&mut self, container: Size) -> Result<(), CoreError> {
        container.validate("container")?;
        if let Some(canvas) = &mut self.canvas {
            let rendered = fit_within(canvas.source.size, container)?;
            canvas.viewport.resize(container, rendered)?;
        }
        self.container = container;
        Ok(())
    }

    fn install_image(&mut self, source: ImageSource) -> Result<(), CoreError> {
        let rendered = fit_within(source.size, self.container)?;
        let viewport = Viewport::new(self.container, rendered)?;
        self.canvas = Some(Canvas { source, viewport });
        self.clear_transient_state();
        Ok(())
    }

    fn clear_transient_state(&mut self) {
        self.gesture = None;
        self.has_panned = false;
        self.open_bubble = None;
        self.editing = None;
        self.pending_transition = None;
    }

    // -- Modes and toolbar --------------------------------------------------

    /// Select a toolbar mode. Choosing `Share` starts a share request.
    pub fn set_mode(&mut self, mode: Mode) -> Result<Option<ShareRequest>, CoreError> {
        match mode.edit_mode() {
            Some(edit_mode) => {
                self.set_edit_mode(edit_mode)?;
                Ok(None)
            }
            None => self.begin_share().map(Some),
        }
    }

    pub fn set_edit_mode(&mut self, mode: EditMode) -> Result<(), CoreError> {
        if self.view_only && mode != EditMode::Move {
            return Err(forbidden("changing mode"));
        }
        self.commit_editor(false);
        self.gesture = None;
        self.share.close();
        self.mode = mode;
        Ok(())
    }

    pub fn set_pin_color(&mut self, color: PinColor) {
        self.pin_color = color;
    }

    // -- Pointer events -----------------------------------------------------

    pub fn pointer_down(&mut self, kind: PointerKind, at: Point, target: PointerTarget) {
        self.share.close();
        if self.canvas.is_none() {
            return;
        }

        // Focus leaves an open comment editor unless the press is on its own
        // pin or bubble.
        let keeps_focus = self.editing.as_ref().is_some_and(|editor| match &target {
            PointerTarget::Pin(id) | PointerTarget::Comment(id) => *id == editor.pin,
            PointerTarget::Canvas => false,
        });
        if !keeps_focus {
            self.commit_editor(false);
        }

        let tracker = DragTracker::start(kind, at);
        let zoomed = self.viewport().is_some_and(Viewport::is_zoomed);
        self.gesture = Some(match target {
            PointerTarget::Pin(pin) if self.can_drag_pins() && self.pins.contains(&pin) => {
                let origin = self
                    .pins
                    .get(&pin)
                    .map(Annotation::position)
                    .unwrap_or(Percent::new(0.0, 0.0));
                Gesture::PinDrag {
                    pin,
                    origin,
                    tracker,
                }
            }
            PointerTarget::Canvas if self.mode == EditMode::Move && zoomed => {
                self.has_panned = false;
                Gesture::Pan(tracker)
            }
            target => Gesture::Press { target, tracker },
        });
    }

    pub fn pointer_move(&mut self, at: Point) -> PointerOutcome {
        let Some(gesture) = self.gesture.take() else {
            return PointerOutcome::Ignored;
        };
        let (gesture, outcome) = self.track(gesture, at);
        self.gesture = Some(gesture);
        outcome
    }

    pub fn pointer_up(&mut self, at: Point) -> PointerOutcome {
        let Some(gesture) = self.gesture.take() else {
            return PointerOutcome::Ignored;
        };
        let (gesture, moved) = self.track(gesture, at);

        match gesture {
            Gesture::Pan(tracker) => match tracker.finish() {
                PressOutcome::Drag => moved,
                PressOutcome::Tap => self.click(PointerTarget::Canvas, at),
            },
            Gesture::PinDrag { pin, tracker, .. } => match tracker.finish() {
                PressOutcome::Drag => {
                    let Some(position) = self.pins.get(&pin).map(Annotation::position) else {
                        return PointerOutcome::Ignored;
                    };
                    let transition = self.zoom_out_and_close();
                    PointerOutcome::PinDropped {
                        pin,
                        position,
                        transition,
                    }
                }
                PressOutcome::Tap => self.click(PointerTarget::Pin(pin), at),
            },
            Gesture::Press { target, tracker } => match tracker.finish() {
                PressOutcome::Drag => PointerOutcome::Ignored,
                PressOutcome::Tap => self.click(target, at),
            },
        }
    }

    /// The pointer left or the press was interrupted: drop the gesture
    /// without clicking.
    pub fn pointer_cancel(&mut self) {
        self.gesture = None;
    }

    fn track(&mut self, gesture: Gesture, at: Point) -> (Gesture, PointerOutcome) {
        match gesture {
            Gesture::Pan(mut tracker) => {
                let outcome = match (tracker.update(at), self.viewport_mut()) {
                    (Some(delta), Some(viewport)) => PointerOutcome::Panned(viewport.pan_by(delta)),
                    _ => PointerOutcome::Ignored,
                };
                if tracker.exceeded_threshold() {
                    self.has_panned = true;
                }
                (Gesture::Pan(tracker), outcome)
            }
            Gesture::PinDrag {
                pin,
                origin,
                mut tracker,
            } => {
                tracker.update(at);
                let outcome = if tracker.exceeded_threshold() {
                    self.drag_pin(&pin, origin, tracker.total_delta())
                } else {
                    PointerOutcome::Ignored
                };
                (
                    Gesture::PinDrag {
                        pin,
                        origin,
                        tracker,
                    },
                    outcome,
                )
            }
            Gesture::Press { target, mut tracker } => {
                tracker.update(at);
                (Gesture::Press { target, tracker }, PointerOutcome::Ignored)
            }
        }
    }

    /// Move a pin by a screen-space displacement from where the drag began.
    fn drag_pin(&mut self, pin: &PinId, origin: Percent, delta: Point) -> PointerOutcome {
        let Some(viewport) = self.viewport() else {
            return PointerOutcome::Ignored;
        };
        let image = viewport.image();
        let scale = viewport.effective_scale();
        let target = Percent::new(
            origin.x + delta.x / (image.width * scale) * 100.0,
            origin.y + delta.y / (image.height * scale) * 100.0,
        );
        match self.pins.move_pin(pin, target) {
            Ok(position) => PointerOutcome::PinDragged {
                pin: pin.clone(),
                position,
            },
            Err(_) => PointerOutcome::Ignored,
        }
    }

    fn click(&mut self, target: PointerTarget, at: Point) -> PointerOutcome {
        match target {
            PointerTarget::Comment(pin) => {
                let editing_this = self.editing.as_ref().is_some_and(|e| e.pin == pin);
                if self.view_only || editing_this {
                    return PointerOutcome::Ignored;
                }
                match self.open_editor(&pin) {
                    Ok(()) => PointerOutcome::EditorOpened(pin),
                    Err(_) => PointerOutcome::Ignored,
                }
            }
            PointerTarget::Pin(pin) => self.click_pin(pin),
            PointerTarget::Canvas => self.click_canvas(at),
        }
    }

    fn click_pin(&mut self, pin: PinId) -> PointerOutcome {
        if self.mode == EditMode::Comment || !self.pins.contains(&pin) {
            return PointerOutcome::Ignored;
        }
        let is_active = self
            .viewport()
            .and_then(Viewport::active_pin)
            .is_some_and(|active| *active == pin);

        if is_active {
            if self.has_panned {
                self.has_panned = false;
                self.zoom_to_pin(&pin);
                return PointerOutcome::Recentered(pin);
            }
            return PointerOutcome::ZoomedOut(self.zoom_out_and_close());
        }
        self.zoom_to_pin(&pin);
        PointerOutcome::ZoomedToPin(pin)
    }

    fn click_canvas(&mut self, at: Point) -> PointerOutcome {
        if self.mode == EditMode::Comment && !self.view_only {
            let Some(Ok(position)) = self.viewport().map(|v| v.screen_to_percent(at)) else {
                return PointerOutcome::Ignored;
            };
            // The empty layer around a small image is not part of it.
            if !position.is_within_bounds() {
                return PointerOutcome::Ignored;
            }
            let id = self.pins.create(position, self.pin_color).id.clone();
            self.open_bubble = Some(id.clone());
            self.editing = Some(CommentEditor {
                pin: id.clone(),
                original_text: String::new(),
            });
            return PointerOutcome::PinCreated(id);
        }
        if self.viewport().is_some_and(Viewport::is_zoomed) {
            return PointerOutcome::ZoomedOut(self.zoom_out_and_close());
        }
        PointerOutcome::Ignored
    }

    // -- Zoom ---------------------------------------------------------------

    fn zoom_to_pin(&mut self, pin: &PinId) {
        let Some(position) = self.pins.get(pin).map(Annotation::position) else {
            return;
        };
        if let Some(viewport) = self.viewport_mut() {
            viewport.pan_to_pin(pin, position);
        }
        self.pending_transition = None;
        self.pins.set_active(Some(pin));
        self.open_bubble = Some(pin.clone());
    }

    /// Zoom out. Bubbles close once the host reports the transition
    /// finished, or immediately when there is nothing to animate.
    fn zoom_out_and_close(&mut self) -> Option<Transition> {
        self.has_panned = false;
        let transition = self.viewport_mut().and_then(Viewport::zoom_out);
        match transition {
            Some(_) => self.pending_transition = transition,
            None => self.close_bubbles(),
        }
        transition
    }

    /// The host finished animating a zoom-out.
    pub fn finish_transition(&mut self) {
        if self.pending_transition.take().is_some() {
            self.close_bubbles();
        }
    }

    fn close_bubbles(&mut self) {
        self.commit_editor(false);
        self.open_bubble = None;
        self.pins.set_active(None);
    }

    /// Manual zoom in by one step. Returns the new level.
    pub fn zoom_in(&mut self) -> Option<f64> {
        self.viewport_mut().map(Viewport::step_zoom_in)
    }

    pub fn zoom_out_step(&mut self) -> Option<f64> {
        self.viewport_mut().map(Viewport::step_zoom_out)
    }

    pub fn reset_zoom(&mut self) -> Option<f64> {
        self.viewport_mut().map(Viewport::reset_manual_zoom)
    }

    // -- Comment editor -----------------------------------------------------

    /// Open the text editor on an existing pin.
    pub fn open_editor(&mut self, pin: &PinId) -> Result<(), CoreError> {
        self.ensure_editable()?;
        let original_text = self
            .pins
            .get(pin)
            .map(|p| p.text.clone())
            .ok_or_else(|| CoreError::NotFound {
                entity: "Annotation",
                id: pin.to_string(),
            })?;
        if self.editing.as_ref().is_some_and(|e| e.pin != *pin) {
            self.commit_editor(false);
        }
        self.editing = Some(CommentEditor {
            pin: pin.clone(),
            original_text,
        });
        self.open_bubble = Some(pin.clone());
        self.pins.set_active(Some(pin));
        Ok(())
    }

    /// Live text from the editor. Blank drafts are kept until committed.
    pub fn input_text(&mut self, text: &str) -> Result<(), CoreError> {
        let pin = self.editing_pin()?;
        self.pins.set_text(&pin, text)
    }

    /// Save the comment and zoom out, or delete the pin if the text is blank.
    pub fn press_enter(&mut self) -> Result<CommentOutcome, CoreError> {
        self.editing_pin()?;
        self.commit_editor(true)
            .ok_or_else(|| CoreError::Internal("comment editor lost its pin".to_string()))
    }

    /// The editor lost focus. Same as Enter.
    pub fn blur(&mut self) -> Result<CommentOutcome, CoreError> {
        self.press_enter()
    }

    /// Restore the text from before the edit, or delete the pin if there was
    /// none.
    pub fn press_escape(&mut self) -> Result<CommentOutcome, CoreError> {
        self.editing_pin()?;
        let Some(editor) = self.editing.take() else {
            return Err(no_editor());
        };
        if editor.original_text.trim().is_empty() {
            self.remove_pin(&editor.pin);
            return Ok(CommentOutcome::Deleted);
        }
        self.pins.set_text(&editor.pin, &editor.original_text)?;
        if self.open_bubble.as_ref() == Some(&editor.pin) {
            self.open_bubble = None;
        }
        Ok(CommentOutcome::Reverted)
    }

    /// Delete a pin. Unknown ids are a no-op returning `false`.
    pub fn delete_pin(&mut self, pin: &PinId) -> Result<bool, CoreError> {
        self.ensure_editable()?;
        Ok(self.remove_pin(pin))
    }

    /// Commit the open editor, if any. Blank text deletes the pin.
    fn commit_editor(&mut self, zoom_out: bool) -> Option<CommentOutcome> {
        let editor = self.editing.take()?;
        let text = self.pins.get(&editor.pin).map(|p| p.text.clone())?;
        match self.pins.commit_text(&editor.pin, &text) {
            Ok(TextCommit::Saved) => {
                if self.open_bubble.as_ref() == Some(&editor.pin) {
                    self.open_bubble = None;
                }
                if zoom_out {
                    self.zoom_out_and_close();
                }
                Some(CommentOutcome::Saved)
            }
            Ok(TextCommit::Deleted) => {
                self.forget_pin(&editor.pin);
                Some(CommentOutcome::Deleted)
            }
            Err(_) => None,
        }
    }

    fn remove_pin(&mut self, pin: &PinId) -> bool {
        let removed = self.pins.delete(pin);
        if removed {
            self.forget_pin(pin);
        }
        removed
    }

    /// Drop every reference to a pin that no longer exists.
    fn forget_pin(&mut self, pin: &PinId) {
        if self.editing.as_ref().is_some_and(|e| e.pin == *pin) {
            self.editing = None;
        }
        if self.open_bubble.as_ref() == Some(pin) {
            self.open_bubble = None;
        }
        let dragging_it = matches!(
            &self.gesture,
            Some(Gesture::PinDrag { pin: dragged, .. }) if dragged == pin
        );
        if dragging_it {
            self.gesture = None;
        }
        let zoomed_on_it = self
            .viewport()
            .and_then(Viewport::active_pin)
            .is_some_and(|active| active == pin);
        if zoomed_on_it {
            self.zoom_out_and_close();
        }
    }

    fn editing_pin(&self) -> Result<PinId, CoreError> {
        self.editing
            .as_ref()
            .map(|e| e.pin.clone())
            .ok_or_else(no_editor)
    }

    // -- Sharing ------------------------------------------------------------

    /// Open the share popup in its loading state and build the request.
    ///
    /// Without an image the popup shows an error and no request is made.
    pub fn begin_share(&mut self) -> Result<ShareRequest, CoreError> {
        if self.view_only {
            return Err(forbidden("sharing"));
        }
        let Some(image) = self.canvas.as_ref().map(|c| c.source.reference.clone()) else {
            self.share.fail(SHARE_NO_IMAGE_MESSAGE);
            return Err(CoreError::Validation(SHARE_NO_IMAGE_MESSAGE.to_string()));
        };
        self.commit_editor(false);
        let ticket = self.share.begin();
        Ok(ShareRequest {
            ticket,
            payload: SharePayload::from_pins(image, self.pins.iter()),
        })
    }

    /// Feed back the gateway's answer. Returns `false` for a stale ticket.
    pub fn finish_share(
        &mut self,
        ticket: ShareTicket,
        base_url: &str,
        outcome: Result<ShareCreated, String>,
    ) -> bool {
        let outcome = outcome.map(|created| share_url(base_url, &created.id));
        self.share.resolve(ticket, outcome)
    }

    /// Hide the share popup; the previous editing mode stays selected.
    pub fn close_share_popup(&mut self) {
        self.share.close();
    }

    // -- Queries ------------------------------------------------------------

    pub fn has_image(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn image(&self) -> Option<&ImageSource> {
        self.canvas.as_ref().map(|c| &c.source)
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.canvas.as_ref().map(|c| &c.viewport)
    }

    fn viewport_mut(&mut self) -> Option<&mut Viewport> {
        self.canvas.as_mut().map(|c| &mut c.viewport)
    }

    pub fn pins(&self) -> &PinStore {
        &self.pins
    }

    pub fn container(&self) -> Size {
        self.container
    }

    /// The toolbar mode to highlight.
    pub fn mode(&self) -> Mode {
        if self.share.is_visible() {
            Mode::Share
        } else {
            self.mode.into()
        }
    }

    pub fn edit_mode(&self) -> EditMode {
        self.mode
    }

    pub fn pin_color(&self) -> PinColor {
        self.pin_color
    }

    pub fn is_view_only(&self) -> bool {
        self.view_only
    }

    pub fn share(&self) -> &ShareFlow {
        &self.share
    }

    pub fn editing(&self) -> Option<&CommentEditor> {
        self.editing.as_ref()
    }

    /// The pin whose comment bubble is open. At most one is.
    pub fn open_bubble(&self) -> Option<&PinId> {
        self.open_bubble.as_ref()
    }

    pub fn pending_transition(&self) -> Option<Transition> {
        self.pending_transition
    }

    pub fn is_panning(&self) -> bool {
        matches!(&self.gesture, Some(Gesture::Pan(t)) if t.exceeded_threshold())
    }

    pub fn is_dragging_pin(&self) -> bool {
        matches!(&self.gesture, Some(Gesture::PinDrag { tracker, .. }) if tracker.exceeded_threshold())
    }

    pub fn is_dimmed(&self, pin: &PinId) -> bool {
        self.viewport().is_some_and(|v| v.is_dimmed(pin))
    }

    /// Where a pin is drawn, in container coordinates.
    pub fn pin_screen_position(&self, pin: &PinId) -> Option<Point> {
        let position = self.pins.get(pin)?.position();
        Some(self.viewport()?.percent_to_screen(position))
    }

    /// Open the bubble to the left when it would overflow the container's
    /// right edge.
    pub fn bubble_side(&self, pin: &PinId, bubble_width: f64) -> Option<BubbleSide> {
        let at = self.pin_screen_position(pin)?;
        if at.x + bubble_width + BUBBLE_MARGIN_PX > self.container.width {
            Some(BubbleSide::Left)
        } else {
            Some(BubbleSide::Right)
        }
    }

    fn can_drag_pins(&self) -> bool {
        !self.view_only && self.mode == EditMode::Move
    }

    fn ensure_editable(&self) -> Result<(), CoreError> {
        if self.view_only {
            Err(forbidden("editing"))
        } else {
            Ok(())
        }
    }
}

fn forbidden(action: &str) -> CoreError {
    CoreError::Forbidden(format!("{action} is disabled for shared images"))
}

fn no_editor() -> CoreError {
    CoreError::Validation("no comment editor is open".to_string())
}
