//! Chat platform integration - Socket Mode bot interface
//!
//! This crate provides the chat surface for intake:
//! - **Socket Mode** (`socket`) - WebSocket event loop (no public URL needed)
//! - **Slash Commands** (`commands`) - `/onboard start`, `/onboard status`, etc.
//! - **Events** (`events`) - Slash commands, button actions, modal submissions
//! - **Blocks** (`blocks`) - Rich message builders and modal form views
//! - **Flow Service** (`service`) - Glue from platform events to the engine
//!
//! # Architecture
//!
//! ```text
//! Chat Events → EventDispatcher → Handlers → OnboardingFlowService → Engine
//!                    ↓
//!              Blocks / Modal UI ← Response
//! ```
//!
//! # Key Types
//!
//! - `SocketModeRunner` - WebSocket event loop with reconnection logic
//! - `EventDispatcher` - Routes events to appropriate handlers
//! - `OnboardingFlowService` - Opens batch modals and replays submissions as turns
//! - `ModalView` - A bounded batch of questions rendered as one form

pub mod blocks;
pub mod commands;
pub mod events;
pub mod service;
pub mod socket;
