//! Owning handles for browser callbacks. Dropping a handle deregisters
//! what it registered, so tearing down the session leaves no listener or
//! animation frame behind.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{AddEventListenerOptions, Event, EventTarget, Window};

struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

/// Registry of DOM event listeners, removed on drop
#[derive(Default)]
pub struct EventListeners {
    entries: Vec<Listener>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event` on `target`. Events that are not an `E`
    /// are ignored.
    pub fn add<E>(&mut self, target: &EventTarget, event: &'static str, handler: impl FnMut(E) + 'static) -> Result<(), JsValue>
    where
        E: JsCast + 'static,
    {
        self.add_with_passive(target, event, true, handler)
    }

    /// Like [`EventListeners::add`], but the handler may call `preventDefault`
    /// (touch events are passive by default on most browsers)
    pub fn add_active<E>(&mut self, target: &EventTarget, event: &'static str, handler: impl FnMut(E) + 'static) -> Result<(), JsValue>
    where
        E: JsCast + 'static,
    {
        self.add_with_passive(target, event, false, handler)
    }

    fn add_with_passive<E>(
        &mut self,
        target: &EventTarget,
        event: &'static str,
        passive: bool,
        mut handler: impl FnMut(E) + 'static,
    ) -> Result<(), JsValue>
    where
        E: JsCast + 'static,
    {
        let closure = Closure::wrap(Box::new(move |e: Event| {
            if let Ok(e) = e.dyn_into::<E>() {
                handler(e);
            }
        }) as Box<dyn FnMut(Event)>);

        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            closure.as_ref().unchecked_ref(),
            &options,
        )?;

        self.entries.push(Listener { target: target.clone(), event, closure });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for EventListeners {
    fn drop(&mut self) {
        for l in self.entries.drain(..) {
            let _ = l.target.remove_event_listener_with_callback(l.event, l.closure.as_ref().unchecked_ref());
        }
        tracing::debug!("event listeners removed");
    }
}

/// A requestAnimationFrame loop. The callback gets the frame timestamp in
/// milliseconds; dropping the handle cancels the pending frame.
pub struct AnimationLoop {
    window: Window,
    pending: Rc<Cell<Option<i32>>>,
    callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
}

impl AnimationLoop {
    pub fn start(window: Window, mut frame: impl FnMut(f64) + 'static) -> Result<Self, JsValue> {
        let pending = Rc::new(Cell::new(None));
        let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));

        let callback_weak = Rc::downgrade(&callback);
        let pending_inner = pending.clone();
        let window_inner = window.clone();
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            pending_inner.set(None);
            frame(timestamp);

            // Reschedule unless the loop was dropped during the frame
            let Some(callback) = callback_weak.upgrade() else { return };
            let callback = callback.borrow();
            let Some(cb) = callback.as_ref() else { return };
            match window_inner.request_animation_frame(cb.as_ref().unchecked_ref()) {
                Ok(id) => pending_inner.set(Some(id)),
                Err(e) => tracing::error!("requestAnimationFrame failed: {e:?}"),
            }
        }) as Box<dyn FnMut(f64)>));

        let id = {
            let cb = callback.borrow();
            let cb = cb.as_ref().ok_or_else(|| JsValue::from_str("animation callback missing"))?;
            window.request_animation_frame(cb.as_ref().unchecked_ref())?
        };
        pending.set(Some(id));

        Ok(Self { window, pending, callback })
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        if let Some(id) = self.pending.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        self.callback.borrow_mut().take();
        tracing::debug!("animation loop stopped");
    }
}
