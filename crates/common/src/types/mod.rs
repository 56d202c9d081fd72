use serde::Serialize;

#[derive(Serialize, Debug, Clone)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

impl Health {
    pub fn ok(service: &'static str) -> Self {
        Self { status: "ok", service, version: env!("CARGO_PKG_VERSION") }
    }
}

/// Generic `{ success, ... }` envelope used by the scan/AI endpoints so the
/// dashboard can branch on a single flag.
#[derive(Serialize, Debug, Clone)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}
