use litsec_types::Address;

/// Where the shell is in the connect / invoke cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    Connected,
    Invoking,
    Result,
    Error,
}

/// Everything the view renders. Owned by `AppController`; changed only
/// through the transition methods below.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppState {
    pub phase: Phase,
    pub wallet_address: Option<Address>,
    /// Raw text of the secret object, parsed on each run.
    pub encrypted_data: String,
    pub prompt: String,
    pub is_connecting: bool,
    pub is_loading: bool,
    pub response: Option<String>,
    pub error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            wallet_address: None,
            encrypted_data: String::new(),
            prompt: String::new(),
            is_connecting: false,
            is_loading: false,
            response: None,
            error: None,
        }
    }
}

impl AppState {
    pub fn is_connected(&self) -> bool {
        self.wallet_address.is_some()
    }

    pub(crate) fn begin_connect(&mut self) {
        self.phase = Phase::Connecting;
        self.is_connecting = true;
        self.error = None;
    }

    pub(crate) fn connect_succeeded(&mut self, address: Address) {
        self.phase = Phase::Connected;
        self.wallet_address = Some(address);
        self.is_connecting = false;
    }

    /// A failed connect leaves any earlier connection in place.
    pub(crate) fn connect_failed(&mut self, message: String) {
        self.phase = if self.is_connected() {
            Phase::Connected
        } else {
            Phase::Idle
        };
        self.is_connecting = false;
        self.error = Some(message);
    }

    pub(crate) fn begin_invoke(&mut self) {
        self.phase = Phase::Invoking;
        self.is_loading = true;
        self.error = None;
    }

    pub(crate) fn invoke_succeeded(&mut self, response: String) {
        self.phase = Phase::Result;
        self.response = Some(response);
        self.is_loading = false;
    }

    pub(crate) fn invoke_failed(&mut self, message: String) {
        self.phase = Phase::Error;
        self.is_loading = false;
        self.error = Some(message);
    }

    /// An error that did not start an operation (e.g. running before
    /// connecting). The phase is unchanged.
    pub(crate) fn report(&mut self, message: String) {
        self.error = Some(message);
    }

    /// Forget the wallet and the last result; keep the typed inputs.
    pub(crate) fn disconnect(&mut self) {
        *self = Self {
            encrypted_data: std::mem::take(&mut self.encrypted_data),
            prompt: std::mem::take(&mut self.prompt),
            ..Self::default()
        };
    }
}
