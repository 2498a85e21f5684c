// [libs/infra/wire/src/constants.rs]
//! Authoritative SPICE wire constants. Channel types, error codes,
//! capability bit names and per-channel message-type tables, reproduced
//! verbatim from the reference protocol definition so the codec and the
//! forensic logging in `inspect` agree on names with any other SPICE
//! implementation.

/// Channel type numbers, as sent in `SpiceLinkMess::channel_type`.
pub mod channel {
    pub const MAIN: u8 = 1;
    pub const DISPLAY: u8 = 2;
    pub const INPUTS: u8 = 3;
    pub const CURSOR: u8 = 4;
    pub const PLAYBACK: u8 = 5;
    pub const RECORD: u8 = 6;
    pub const TUNNEL_OBSOLETE: u8 = 7;
    pub const USBREDIR: u8 = 8;
    pub const PORT: u8 = 9;
    pub const WEBDAV: u8 = 10;

    pub fn name(n: u8) -> &'static str {
        match n {
            MAIN => "main",
            DISPLAY => "display",
            INPUTS => "inputs",
            CURSOR => "cursor",
            PLAYBACK => "playback",
            RECORD => "record",
            TUNNEL_OBSOLETE => "tunnel (obsolete)",
            USBREDIR => "usbredir",
            PORT => "port",
            WEBDAV => "webdav",
            _ => "unknown",
        }
    }
}

/// Link-reply error codes.
pub mod error_code {
    pub const OK: u32 = 0;
    pub const ERROR: u32 = 1;
    pub const INVALID_MAGIC: u32 = 2;
    pub const INVALID_DATA: u32 = 3;
    pub const VERSION_MISMATCH: u32 = 4;
    pub const NEED_SECURED: u32 = 5;
    pub const NEED_UNSECURED: u32 = 6;
    pub const PERMISSION_DENIED: u32 = 7;
    pub const BAD_CONNECTION_ID: u32 = 8;
    pub const CHANNEL_UNAVAILABLE: u32 = 9;

    pub fn name(n: u32) -> &'static str {
        match n {
            OK => "ok",
            ERROR => "error",
            INVALID_MAGIC => "invalid_magic",
            INVALID_DATA => "invalid_data",
            VERSION_MISMATCH => "version_mismatch",
            NEED_SECURED => "need_secured",
            NEED_UNSECURED => "need_unsecured",
            PERMISSION_DENIED => "permission_denied",
            BAD_CONNECTION_ID => "bad_connection_id",
            CHANNEL_UNAVAILABLE => "channel_unavailable",
            _ => "unknown",
        }
    }
}

/// Common capability bits (channel-independent).
pub mod common_caps {
    pub const AUTH_SELECTION: u32 = 1 << 0;
    pub const AUTH_SPICE: u32 = 1 << 1;
    pub const AUTH_SASL: u32 = 1 << 2;
    pub const MINI_HEADER: u32 = 1 << 3;

    /// `AuthSelection | AuthSpice | MiniHeader`, what the proxy advertises.
    pub const DEFAULT: u32 = AUTH_SELECTION | AUTH_SPICE | MINI_HEADER;

    pub fn names(bits: u32) -> Vec<&'static str> {
        let table: &[(u32, &str)] = &[
            (AUTH_SELECTION, "AuthSelection"),
            (AUTH_SPICE, "AuthSpice"),
            (AUTH_SASL, "AuthSASL"),
            (MINI_HEADER, "MiniHeader"),
        ];
        table
            .iter()
            .filter(|(bit, _)| bits & bit != 0)
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Main-channel (channel_type=1) capability bits.
pub mod main_caps {
    pub const SEMI_SEAMLESS_MIGRATE: u32 = 1 << 0;
    pub const NAME_AND_UUID: u32 = 1 << 1;
    pub const AGENT_CONNECTED_TOKENS: u32 = 1 << 2;
    pub const SEAMLESS_MIGRATE: u32 = 1 << 3;

    /// `SemiSeamlessMigrate | SeamlessMigrate`, what the proxy advertises.
    pub const DEFAULT: u32 = SEMI_SEAMLESS_MIGRATE | SEAMLESS_MIGRATE;

    pub fn names(bits: u32) -> Vec<&'static str> {
        let table: &[(u32, &str)] = &[
            (SEMI_SEAMLESS_MIGRATE, "SemiSeamlessMigrate"),
            (NAME_AND_UUID, "NameAndUUID"),
            (AGENT_CONNECTED_TOKENS, "AgentConnectedTokens"),
            (SEAMLESS_MIGRATE, "SeamlessMigrate"),
        ];
        table
            .iter()
            .filter(|(bit, _)| bits & bit != 0)
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Common message type codes, client → server.
pub mod client_common {
    pub const ACK_SYNC: u16 = 1;
    pub const ACK: u16 = 2;
    pub const PONG: u16 = 3;
    pub const MIGRATE_FLUSH_MARK: u16 = 4;
    pub const MIGRATE_DATA: u16 = 5;
    pub const DISCONNECTING: u16 = 6;

    pub fn name(n: u16) -> Option<&'static str> {
        Some(match n {
            ACK_SYNC => "ack_sync",
            ACK => "ack",
            PONG => "pong",
            MIGRATE_FLUSH_MARK => "migrate_flush_mark",
            MIGRATE_DATA => "migrate_data",
            DISCONNECTING => "disconnecting",
            _ => return None,
        })
    }
}

/// Common message type codes, server → client.
pub mod server_common {
    pub const MIGRATE: u16 = 1;
    pub const MIGRATE_DATA: u16 = 2;
    pub const SET_ACK: u16 = 3;
    pub const PING: u16 = 4;
    pub const WAIT_FOR_CHANNELS: u16 = 5;
    pub const DISCONNECTING: u16 = 6;
    pub const NOTIFY: u16 = 7;

    pub fn name(n: u16) -> Option<&'static str> {
        Some(match n {
            MIGRATE => "migrate",
            MIGRATE_DATA => "migrate_data",
            SET_ACK => "set_ack",
            PING => "ping",
            WAIT_FOR_CHANNELS => "wait_for_channels",
            DISCONNECTING => "disconnecting",
            NOTIFY => "notify",
            _ => return None,
        })
    }
}

/// Main-channel-only type codes.
pub mod main_types {
    pub mod client {
        pub const ATTACH_CHANNELS: u16 = 104;
        pub fn name(n: u16) -> Option<&'static str> {
            super::super::client_common::name(n).or(match n {
                ATTACH_CHANNELS => Some("attach_channels"),
                _ => None,
            })
        }
    }
    pub mod server {
        pub const INIT: u16 = 103;
        pub const CHANNELS_LIST: u16 = 104;
        pub fn name(n: u16) -> Option<&'static str> {
            super::super::server_common::name(n).or(match n {
                INIT => Some("init"),
                CHANNELS_LIST => Some("channels_list"),
                _ => None,
            })
        }
    }
}

/// Display-channel-only type codes.
pub mod display_types {
    pub mod client {
        pub const INIT: u16 = 101;
        pub fn name(n: u16) -> Option<&'static str> {
            super::super::client_common::name(n).or(match n {
                INIT => Some("init"),
                _ => None,
            })
        }
    }
    pub mod server {
        pub const MODE: u16 = 101;
        pub const MARK: u16 = 102;
        pub const RESET: u16 = 103;
        pub const COPY_BITS: u16 = 104;
        pub const INVALIDATE_LIST: u16 = 105;
        pub const INVALIDATE_ALL_PIXMAPS: u16 = 106;
        pub const INVALIDATE_PALETTE: u16 = 107;
        pub const INVALIDATE_ALL_PALETTES: u16 = 108;
        pub const STREAM_CREATE: u16 = 122;
        pub const STREAM_DATA: u16 = 123;
        pub const STREAM_CLIP: u16 = 124;
        pub const STREAM_DESTROY: u16 = 125;
        pub const STREAM_DESTROY_ALL: u16 = 126;
        pub const DRAW_FILL: u16 = 302;
        pub const DRAW_OPAQUE: u16 = 303;
        pub const DRAW_COPY: u16 = 304;
        pub const DRAW_BLEND: u16 = 305;
        pub const DRAW_BLACKNESS: u16 = 306;
        pub const DRAW_WHITENESS: u16 = 307;
        pub const DRAW_INVERS: u16 = 308;
        pub const DRAW_ROP3: u16 = 309;
        pub const DRAW_STROKE: u16 = 310;
        pub const DRAW_TEXT: u16 = 311;
        pub const DRAW_TRANSPARENT: u16 = 312;
        pub const DRAW_ALPHA_BLEND: u16 = 313;
        pub const SURFACE_CREATE: u16 = 314;
        pub const SURFACE_DESTROY: u16 = 315;
        pub const STREAM_DATA_SIZED: u16 = 316;
        pub const MONITORS_CONFIG: u16 = 317;
        pub const DRAW_COMPOSITE: u16 = 318;
        pub const STREAM_ACTIVATE_REPORT: u16 = 319;
        pub const GL_SCANOUT_UNIX: u16 = 320;
        pub const GL_DRAW: u16 = 321;

        pub fn name(n: u16) -> Option<&'static str> {
            super::super::server_common::name(n).or(Some(match n {
                MODE => "mode",
                MARK => "mark",
                RESET => "reset",
                COPY_BITS => "copy_bits",
                INVALIDATE_LIST => "invalidate_list",
                INVALIDATE_ALL_PIXMAPS => "invalidate_all_pixmaps",
                INVALIDATE_PALETTE => "invalidate_palette",
                INVALIDATE_ALL_PALETTES => "invalidate_all_palettes",
                STREAM_CREATE => "stream_create",
                STREAM_DATA => "stream_data",
                STREAM_CLIP => "stream_clip",
                STREAM_DESTROY => "stream_destroy",
                STREAM_DESTROY_ALL => "stream_destroy_all",
                DRAW_FILL => "draw_fill",
                DRAW_OPAQUE => "draw_opaque",
                DRAW_COPY => "draw_copy",
                DRAW_BLEND => "draw_blend",
                DRAW_BLACKNESS => "draw_blackness",
                DRAW_WHITENESS => "draw_whiteness",
                DRAW_INVERS => "draw_invers",
                DRAW_ROP3 => "draw_rop3",
                DRAW_STROKE => "draw_stroke",
                DRAW_TEXT => "draw_text",
                DRAW_TRANSPARENT => "draw_transparent",
                DRAW_ALPHA_BLEND => "draw_alpha_blend",
                SURFACE_CREATE => "surface_create",
                SURFACE_DESTROY => "surface_destroy",
                STREAM_DATA_SIZED => "stream_data_sized",
                MONITORS_CONFIG => "monitors_config",
                DRAW_COMPOSITE => "draw_composite",
                STREAM_ACTIVATE_REPORT => "stream_activate_report",
                GL_SCANOUT_UNIX => "gl_scanout_unix",
                GL_DRAW => "gl_draw",
                _ => return None,
            }))
        }
    }
}

/// Inputs-channel-only type codes.
pub mod inputs_types {
    pub mod client {
        pub const KEY_DOWN: u16 = 101;
        pub const KEY_UP: u16 = 102;
        pub const KEY_MODIFIERS: u16 = 103;
        pub const KEY_SCANCODE: u16 = 104;
        pub const MOUSE_MOTION: u16 = 111;
        pub const MOUSE_POSITION: u16 = 112;
        pub const MOUSE_PRESS: u16 = 113;
        pub const MOUSE_RELEASE: u16 = 114;

        pub fn name(n: u16) -> Option<&'static str> {
            super::super::client_common::name(n).or(Some(match n {
                KEY_DOWN => "key_down",
                KEY_UP => "key_up",
                KEY_MODIFIERS => "key_modifiers",
                KEY_SCANCODE => "key_scancode",
                MOUSE_MOTION => "mouse_motion",
                MOUSE_POSITION => "mouse_position",
                MOUSE_PRESS => "mouse_press",
                MOUSE_RELEASE => "mouse_release",
                _ => return None,
            }))
        }
    }
    pub mod server {
        pub const INIT: u16 = 101;
        pub const KEY_MODIFIERS: u16 = 102;
        pub const MOUSE_MOTION_ACK: u16 = 111;

        pub fn name(n: u16) -> Option<&'static str> {
            super::super::server_common::name(n).or(Some(match n {
                INIT => "init",
                KEY_MODIFIERS => "key_modifiers",
                MOUSE_MOTION_ACK => "mouse_motion_ack",
                _ => return None,
            }))
        }
    }

    /// Keyboard modifier-lock flags (`key_modifiers` payload).
    pub const SCROLL_LOCK: u8 = 1 << 0;
    pub const NUM_LOCK: u8 = 1 << 1;
    pub const CAPS_LOCK: u8 = 1 << 2;
}

/// Cursor-channel-only type codes.
pub mod cursor_types {
    pub mod client {
        pub fn name(n: u16) -> Option<&'static str> {
            super::super::client_common::name(n)
        }
    }
    pub mod server {
        pub const INIT: u16 = 101;
        pub const RESET: u16 = 102;
        pub const SET: u16 = 103;
        pub const MOVE: u16 = 104;
        pub const HIDE: u16 = 105;
        pub const TRAIL: u16 = 106;
        pub const INVALIDATE_ONE: u16 = 107;
        pub const INVALIDATE_ALL: u16 = 108;

        pub fn name(n: u16) -> Option<&'static str> {
            super::super::server_common::name(n).or(Some(match n {
                INIT => "init",
                RESET => "reset",
                SET => "set",
                MOVE => "move",
                HIDE => "hide",
                TRAIL => "trail",
                INVALIDATE_ONE => "invalidate_one",
                INVALIDATE_ALL => "invalidate_all",
                _ => return None,
            }))
        }
    }
}

/// Port (USB redirection)-channel-only type codes; identical in both
/// directions, as in the reference implementation.
pub mod port_types {
    pub const VMC_DATA: u16 = 101;
    pub const VMC_COMPRESSED_DATA: u16 = 102;

    pub fn name(n: u16) -> Option<&'static str> {
        super::client_common::name(n).or(Some(match n {
            VMC_DATA => "vmc_data",
            VMC_COMPRESSED_DATA => "vmc_compressed_data",
            _ => return None,
        }))
    }
}

/// USB redirection sub-protocol packet types, decoded only when
/// `TRAFFIC_INSPECTION_INTIMATE` is set (see `inspect::port`).
pub mod usb_redir {
    pub const HELLO: u32 = 0;
    pub const DEVICE_CONNECT: u32 = 1;
    pub const DEVICE_DISCONNECT: u32 = 2;
    pub const RESET: u32 = 3;
    pub const INTERFACE_INFO: u32 = 4;
    pub const EP_INFO: u32 = 5;
    pub const CONTROL_PACKET: u32 = 100;
    pub const BULK_PACKET: u32 = 101;
    pub const ISO_PACKET: u32 = 102;
    pub const INTERRUPT_PACKET: u32 = 103;

    pub fn name(n: u32) -> &'static str {
        match n {
            HELLO => "usb_redir_hello",
            DEVICE_CONNECT => "usb_redir_device_connect",
            DEVICE_DISCONNECT => "usb_redir_device_disconnect",
            RESET => "usb_redir_reset",
            INTERFACE_INFO => "usb_redir_interface_info",
            EP_INFO => "usb_redir_ep_info",
            CONTROL_PACKET => "usb_redir_control_packet",
            BULK_PACKET => "usb_redir_bulk_packet",
            ISO_PACKET => "usb_redir_iso_packet",
            INTERRUPT_PACKET => "usb_redir_interrupt_packet",
            _ => "usb_redir_unknown",
        }
    }
}

/// Display channel raster operations, image types and clip types — used
/// only by the forensic header decode in `inspect::display` under
/// `TRAFFIC_INSPECTION_INTIMATE`; pixel payloads themselves are never
/// decompressed.
pub mod display_forensics {
    pub const ROP_PUT: u16 = 1 << 3;
    pub const ROP_OR: u16 = 1 << 4;
    pub const ROP_AND: u16 = 1 << 5;
    pub const ROP_XOR: u16 = 1 << 6;

    pub fn image_type_name(n: u8) -> &'static str {
        match n {
            0 => "pixmap",
            1 => "quic",
            100 => "lz_palette",
            101 => "lz_rgb",
            102 => "glz_rgb",
            103 => "from_cache",
            _ => "unknown",
        }
    }

    pub fn clip_type_name(n: u8) -> &'static str {
        match n {
            0 => "none",
            1 => "rects",
            2 => "path",
            _ => "unknown",
        }
    }
}
