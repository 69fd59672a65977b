//! JSON-RPC 2.0 communication layer for host page integration.
//!
//! Implements bidirectional messaging between the Bevy engine and its host page via
//! iframe postMessage, supporting both request-response and notification patterns.
//!
//! ## Architecture
//!
//! The RPC system uses standard JSON-RPC 2.0 protocol with:
//! - **Requests**: Expect responses with matching IDs
//! - **Notifications**: One-way messages without responses
//! - **Responses**: Reply to requests with results or errors
//!
//! ## Message Flow
//!
//! ```text
//! Host page (parent window)  <──postMessage──>  Bevy (iframe canvas)
//!        │                                            │
//!        ├─ {"method":"set_edge_display","id":3} ───> │
//!        │                                            ├─ update CadPassSettings
//!        │ <──────────────────── {"result":..,"id":3} ┤
//!        │                                            │
//!        │ <──────────── {"method":"profile_changed"} ┤  (ProfileEvent)
//! ```
//!
//! Handlers are plain functions from request params and engine state to
//! `Result<Value, RpcError>`; `handle_rpc_request` dispatches on the method
//! name. Systems push notifications with `WebRpcInterface::send_notification`,
//! and everything queued during a frame is posted at the end of it.
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//!
//! ## Existing Methods
//!
//! ### Diagnostics
//! - `get_fps`: Retrieve current frame rate
//!
//! ### Edge Display
//! - `get_edge_display`: Current `transparent`, `colored`, `visible_edge`,
//!   `hidden_edge` and `silhouette` flags
//! - `set_edge_display`: Partial update; omitted flags keep their value
//!
//! ### Profile
//! - `get_profile_state`: Phase, active handle, plane `(normal, constant)`
//!   and the detected axis with its similarity
//!
//! ## Notifications
//!
//! - `fps_update`: Every 0.5 s
//! - `profile_changed`: On plane pick, drag start and drag stop, carrying
//!   the event and the resulting profile state

/// JSON-RPC 2.0 bidirectional communication system for the host page.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
