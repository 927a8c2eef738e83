//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names consistent between the engine and its callers.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Diff context
pub const FIELD_PATH: &str = "path";
pub const FIELD_CHANGED: &str = "changed";
pub const FIELD_DROPPED: &str = "dropped";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Canonical operation names
pub const OP_PATCH_PAYLOAD: &str = "patch_payload";
pub const OP_PATCH_PAYLOAD_NO_CHANGES: &str = "patch_payload_no_changes";
pub const OP_PATCH_PAYLOAD_CONVERTED: &str = "patch_payload_converted";
pub const OP_PATCH_TREES: &str = "patch_trees";
