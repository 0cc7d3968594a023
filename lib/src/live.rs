use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::notify::{Notifier, Toast};
use crate::resources::live_class_paths;
use crate::session::{AuthUser, Session};

/// Vendor events the bridge listens to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConferenceEvent {
    VideoConferenceJoined,
    ReadyToClose,
    Other(String),
}

impl ConferenceEvent {
    pub fn from_vendor(name: &str) -> Self {
        match name {
            "videoConferenceJoined" => Self::VideoConferenceJoined,
            "readyToClose" => Self::ReadyToClose,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// What the bridge reports upward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeSignal {
    ModeratorJoined,
    MeetingEnded,
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// `<app id>/<room name>`.
    pub room_path: String,
    pub jwt: SecretString,
    pub display_name: String,
    pub email: Option<String>,
}

/// The conferencing provider's client-side API.
#[allow(async_fn_in_trait)]
pub trait ConferenceSdk {
    type Session;

    /// Whether the provider script is already present.
    fn is_loaded(&self) -> bool;

    async fn load_script(&mut self, app_id: &str) -> Result<()>;

    fn create_session(&mut self, options: &SessionOptions) -> Result<Self::Session>;

    fn dispose(&mut self, session: Self::Session);
}

struct Mounted<S> {
    room: String,
    session: S,
    announced: bool,
}

/// Translates conference lifecycle events into application signals. Holds
/// nothing but the current session handle.
pub struct LiveClassBridge<K: ConferenceSdk> {
    sdk: K,
    app_id: String,
    user: AuthUser,
    mounted: Option<Mounted<K::Session>>,
}

impl<K: ConferenceSdk> LiveClassBridge<K> {
    pub fn new(sdk: K, app_id: impl Into<String>, user: AuthUser) -> Self {
        Self {
            sdk,
            app_id: app_id.into(),
            user,
            mounted: None,
        }
    }

    /// Bridge for the signed-in user of `session`, which must carry the
    /// provider app id.
    pub fn for_session(sdk: K, session: &Session) -> Result<Self> {
        let app_id = session
            .conference_app_id
            .clone()
            .ok_or_else(|| Error::InvalidInput("Live classes are not configured".into()))?;

        Ok(Self::new(sdk, app_id, session.user.clone()))
    }

    pub fn room(&self) -> Option<&str> {
        self.mounted.as_ref().map(|mounted| mounted.room.as_str())
    }

    pub fn sdk(&self) -> &K {
        &self.sdk
    }

    /// Joins `room`, replacing any session for a different room.
    pub async fn mount(&mut self, room: &str, token: SecretString) -> Result<()> {
        if room.trim().is_empty() || token.expose_secret().trim().is_empty() {
            return Err(Error::InvalidInput(
                "A live class needs a room name and a token".into(),
            ));
        }

        if self.room() == Some(room) {
            return Ok(());
        }

        if !self.sdk.is_loaded() {
            self.sdk.load_script(&self.app_id).await?;
        }

        self.unmount();

        let options = SessionOptions {
            room_path: format!("{}/{}", self.app_id, room),
            jwt: token,
            display_name: self.user.name.clone(),
            email: self.user.email.clone(),
        };
        let session = self.sdk.create_session(&options)?;
        tracing::debug!(room_path = %options.room_path, "conference session created");

        self.mounted = Some(Mounted {
            room: room.to_owned(),
            session,
            announced: false,
        });

        Ok(())
    }

    pub fn unmount(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            tracing::debug!(room = %mounted.room, "conference session disposed");
            self.sdk.dispose(mounted.session);
        }
    }

    pub fn handle_event(&mut self, event: &ConferenceEvent) -> Option<BridgeSignal> {
        let mounted = self.mounted.as_mut()?;

        match event {
            ConferenceEvent::VideoConferenceJoined if self.user.is_admin && !mounted.announced => {
                mounted.announced = true;

                Some(BridgeSignal::ModeratorJoined)
            }
            ConferenceEvent::ReadyToClose => {
                mounted.announced = false;

                Some(BridgeSignal::MeetingEnded)
            }
            _ => None,
        }
    }
}

impl<K: ConferenceSdk> Drop for LiveClassBridge<K> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Wires a bridge to the backend: a moderator joining opens the class for
/// students, and the meeting closing ends it.
pub struct LiveClassController<K: ConferenceSdk, B, N> {
    bridge: LiveClassBridge<K>,
    backend: B,
    notifier: N,
    live_class_id: i64,
}

impl<K, B, N> LiveClassController<K, B, N>
where
    K: ConferenceSdk,
    B: Backend,
    N: Notifier,
{
    pub fn new(bridge: LiveClassBridge<K>, backend: B, notifier: N, live_class_id: i64) -> Self {
        Self {
            bridge,
            backend,
            notifier,
            live_class_id,
        }
    }

    pub fn bridge(&self) -> &LiveClassBridge<K> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut LiveClassBridge<K> {
        &mut self.bridge
    }

    pub async fn on_event(&mut self, event: &ConferenceEvent) -> Result<Option<BridgeSignal>> {
        let Some(signal) = self.bridge.handle_event(event) else {
            return Ok(None);
        };

        let (path, message) = match signal {
            BridgeSignal::ModeratorJoined => (
                live_class_paths::open(self.live_class_id),
                "Class opened for students",
            ),
            BridgeSignal::MeetingEnded => (live_class_paths::end(self.live_class_id), "Class ended"),
        };

        match self.backend.post::<_, Value>(&path, &Value::Null).await {
            Ok(_) => {
                self.notifier.notify(Toast::success(message));

                Ok(Some(signal))
            }
            Err(err) => {
                self.notifier.failure(&err);

                Err(err)
            }
        }
    }
}
