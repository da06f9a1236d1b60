//! Tray UI wiring.
//!
//! The engine dispatches observer callbacks while the control is mutably
//! borrowed, so callbacks must work only from their arguments and shared
//! handles. Widgets set programmatically hold a guard cell so their change
//! signals don't loop back into the engine.

mod preferences;
mod slider;
mod tray;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glib::Continue;
use tracing::{info, warn};

use crate::helper::MixerHelper;
use crate::mixer::{
    CardId, CardRegistry, ChangeDetector, ChangeObserver, ChangeOrigin, ElemAddr, MixerBackend,
    MixerControl, PollHandle, StatusInfo, Volume,
};
use crate::notify::Notification;
use crate::settings::Settings;

use slider::SliderWindow;
use tray::Tray;

pub struct App {
    settings: Arc<Settings>,
    registry: Rc<CardRegistry>,
    control: Rc<RefCell<MixerControl>>,
    detector: Rc<RefCell<ChangeDetector>>,
    poll: RefCell<PollHandle>,
    window: Rc<SliderWindow>,
    status: Rc<StatusObserver>,
    tray: Rc<RefCell<Option<Tray>>>,
    helper: Rc<MixerHelper>,
}

impl App {
    pub fn new(
        settings: Arc<Settings>,
        backend: Rc<dyn MixerBackend>,
        registry: Rc<CardRegistry>,
    ) -> Rc<Self> {
        let addr = configured_addr(&settings, &registry);
        info!("driving mixer element {}", addr);

        let emulate = settings.r().app().emulate_mute;
        let control = Rc::new(RefCell::new(MixerControl::new(
            settings.clone(),
            backend,
            addr,
            emulate,
        )));

        let window = SliderWindow::new(control.clone(), settings.clone());
        window.rebuild();

        let tray = Rc::new(RefCell::new(None));
        let status = Rc::new(StatusObserver::new(settings.clone(), tray.clone()));
        {
            let mut control = control.borrow_mut();
            control.add_observer(window.clone());
            control.add_observer(status.clone());
        }

        let detector = Rc::new(RefCell::new(ChangeDetector::new()));
        detector.borrow_mut().add(control.clone());
        let poll = RefCell::new(PollHandle::connect(detector.clone()));

        let helper = Rc::new(MixerHelper::new(settings.clone()));

        let this = Rc::new(Self {
            settings,
            registry,
            control,
            detector,
            poll,
            window,
            status,
            tray,
            helper,
        });
        *this.tray.borrow_mut() = Some(Tray::new(&this));
        this.refresh_status();
        this
    }

    /// Run the main loop until quit or SIGINT.
    pub fn run(self: &Rc<Self>) {
        let (tx, rx) = glib::MainContext::channel(glib::PRIORITY_DEFAULT);
        if let Err(e) = ctrlc::set_handler(move || {
            let _ = tx.send(());
        }) {
            warn!("can't install SIGINT handler: {}", e);
        }
        rx.attach(None, |_| {
            gtk::main_quit();
            Continue(false)
        });
        gtk::main();
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn registry(&self) -> &Rc<CardRegistry> {
        &self.registry
    }

    pub fn helper(&self) -> &Rc<MixerHelper> {
        &self.helper
    }

    pub fn toggle_slider(&self) {
        self.window.toggle();
    }

    pub fn toggle_mute(&self) {
        self.control.borrow_mut().toggle_mute();
    }

    pub fn step_volume(&self, direction: Volume) {
        let step = self.settings.r().app().scale_increment;
        self.control.borrow_mut().step_volume(direction * step);
    }

    /// Push the current state to the tray and notification surfaces
    /// without raising a bubble.
    pub fn refresh_status(&self) {
        let info = self.control.borrow().status_info();
        self.status.refresh(&info);
    }

    /// Switch the active element, persist the choice and restart polling
    /// against the new target.
    pub fn apply_selection(&self, card: CardId, control: String, cid: u32) {
        info!("switching to hw:{} {}:{}", card, control, cid);
        {
            let mut app = self.settings.w().app();
            app.card_index = card;
            app.set_selection(card, control.clone(), cid);
        }
        if let Err(e) = self.settings.sync() {
            warn!("can't save settings: {}", e);
        }

        let emulate = self.settings.r().app().emulate_mute;
        self.poll.borrow_mut().disconnect();
        self.control
            .borrow_mut()
            .update(ElemAddr::new(card, control, cid), emulate);
        self.window.rebuild();
        self.refresh_status();
        *self.poll.borrow_mut() = PollHandle::connect(self.detector.clone());
    }
}

/// The element to drive at startup: the persisted selection if any,
/// otherwise the card's first usable element, otherwise `Master`.
fn configured_addr(settings: &Arc<Settings>, registry: &Rc<CardRegistry>) -> ElemAddr {
    let (card, selection) = {
        let app = settings.r().app();
        (app.card_index, app.selection(app.card_index))
    };
    if let Some((control, cid)) = selection {
        return ElemAddr::new(card, control, cid);
    }
    match registry.mixer_elements(card).into_iter().next() {
        Some((control, cid)) => ElemAddr::new(card, control, cid),
        None => ElemAddr::new(card, "Master".to_string(), 0),
    }
}

/// Routes engine changes to the tray icon and the notification bubble.
/// External changes additionally raise the bubble when enabled.
struct StatusObserver {
    settings: Arc<Settings>,
    tray: Rc<RefCell<Option<Tray>>>,
    notify: Option<Rc<RefCell<Notification>>>,
    /// Card and mixer name of the active element, cached so callbacks
    /// don't have to reach back into the borrowed control.
    names: RefCell<(String, String)>,
}

impl StatusObserver {
    fn new(settings: Arc<Settings>, tray: Rc<RefCell<Option<Tray>>>) -> Self {
        let timeout = settings.r().app().notify_timeout_ms;
        let notify = match Notification::open(timeout) {
            Ok(n) => Some(Rc::new(RefCell::new(n))),
            Err(e) => {
                warn!("notifications unavailable: {}", e);
                None
            }
        };
        Self {
            settings,
            tray,
            notify,
            names: RefCell::new((String::new(), String::new())),
        }
    }

    fn refresh(&self, info: &StatusInfo) {
        *self.names.borrow_mut() = (info.card_name.clone(), info.mixer_name.clone());
        self.push(info);
    }

    fn push(&self, info: &StatusInfo) {
        if let Some(tray) = self.tray.borrow_mut().as_mut() {
            tray.update(info);
        }
        if let Some(notify) = &self.notify {
            notify.borrow_mut().update(info);
        }
    }
}

impl ChangeObserver for StatusObserver {
    fn any_changed(&self, volume: &[Volume], muted: bool, origin: ChangeOrigin) {
        let (card_name, mixer_name) = self.names.borrow().clone();
        let info = StatusInfo {
            volume: volume.to_vec(),
            muted,
            card_name,
            mixer_name,
        };
        self.push(&info);
        if origin == ChangeOrigin::External && self.settings.r().app().show_notify {
            if let Some(notify) = &self.notify {
                if let Err(e) = notify.borrow_mut().show() {
                    warn!("can't show notification: {}", e);
                }
            }
        }
    }
}
