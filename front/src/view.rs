//! Transient view state. Nothing here is sent to the server except the final
//! id order of a finished drag.

use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct ViewState {
    open_dropdown: Option<Uuid>,
    drag: Option<Drag>,
}

impl ViewState {
    pub fn open_dropdown(&self) -> Option<Uuid> {
        self.open_dropdown
    }

    /// Opens the status dropdown of `goal_id`, or closes it if it is the one
    /// already open. At most one dropdown is open at a time.
    pub fn toggle_dropdown(&mut self, goal_id: Uuid) {
        self.open_dropdown = match self.open_dropdown {
            Some(open) if open == goal_id => None,
            _ => Some(goal_id),
        };
    }

    pub fn close_dropdown(&mut self) {
        self.open_dropdown = None;
    }

    pub fn start_drag(&mut self, ids: impl IntoIterator<Item = Uuid>) {
        let ids: Vec<Uuid> = ids.into_iter().collect();
        self.drag = Some(Drag {
            original: ids.clone(),
            ids,
        });
    }

    pub fn drag_order(&self) -> Option<&[Uuid]> {
        self.drag.as_ref().map(|drag| drag.ids.as_slice())
    }

    /// Moves `active` to the position currently held by `over`.
    pub fn drag_over(&mut self, active: Uuid, over: Uuid) {
        if let Some(drag) = &mut self.drag {
            drag.move_item(active, over);
        }
    }

    /// Ends the drag. Returns the new id order if it differs from the order
    /// the drag started with.
    pub fn finish_drag(&mut self) -> Option<Vec<Uuid>> {
        let drag = self.drag.take()?;
        (drag.ids != drag.original).then_some(drag.ids)
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }
}

#[derive(Clone, Debug)]
struct Drag {
    original: Vec<Uuid>,
    ids: Vec<Uuid>,
}

impl Drag {
    fn move_item(&mut self, active: Uuid, over: Uuid) {
        let from = self.ids.iter().position(|id| *id == active);
        let to = self.ids.iter().position(|id| *id == over);

        if let (Some(from), Some(to)) = (from, to) {
            let id = self.ids.remove(from);
            self.ids.insert(to, id);
        }
    }
}
