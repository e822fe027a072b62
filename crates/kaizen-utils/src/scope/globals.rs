//! Global variable names per environment.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Browser,
    Node,
    CommonJs,
    Worker,
}

impl Environment {
    pub fn globals(self) -> &'static [&'static str] {
        match self {
            Environment::Browser => BROWSER,
            Environment::Node => NODE,
            Environment::CommonJs => COMMONJS,
            Environment::Worker => WORKER,
        }
    }
}

/// ECMAScript built-in globals.
pub const BUILTIN: &[&str] = &[
    "AggregateError",
    "Array",
    "ArrayBuffer",
    "Atomics",
    "BigInt",
    "BigInt64Array",
    "BigUint64Array",
    "Boolean",
    "DataView",
    "Date",
    "decodeURI",
    "decodeURIComponent",
    "encodeURI",
    "encodeURIComponent",
    "Error",
    "escape",
    "eval",
    "EvalError",
    "FinalizationRegistry",
    "Float32Array",
    "Float64Array",
    "Function",
    "globalThis",
    "Infinity",
    "Int16Array",
    "Int32Array",
    "Int8Array",
    "Intl",
    "isFinite",
    "isNaN",
    "Iterator",
    "JSON",
    "Map",
    "Math",
    "NaN",
    "Number",
    "Object",
    "parseFloat",
    "parseInt",
    "Promise",
    "Proxy",
    "RangeError",
    "ReferenceError",
    "Reflect",
    "RegExp",
    "Set",
    "SharedArrayBuffer",
    "String",
    "Symbol",
    "SyntaxError",
    "TypeError",
    "Uint16Array",
    "Uint32Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "undefined",
    "unescape",
    "URIError",
    "WeakMap",
    "WeakRef",
    "WeakSet",
];

const BROWSER: &[&str] = &[
    "AbortController",
    "AbortSignal",
    "alert",
    "atob",
    "Blob",
    "btoa",
    "cancelAnimationFrame",
    "clearInterval",
    "clearTimeout",
    "confirm",
    "console",
    "crypto",
    "CustomEvent",
    "customElements",
    "document",
    "Element",
    "Event",
    "EventTarget",
    "fetch",
    "File",
    "FormData",
    "getComputedStyle",
    "Headers",
    "history",
    "HTMLElement",
    "IntersectionObserver",
    "localStorage",
    "location",
    "matchMedia",
    "MutationObserver",
    "navigator",
    "Node",
    "performance",
    "postMessage",
    "prompt",
    "queueMicrotask",
    "Request",
    "requestAnimationFrame",
    "ResizeObserver",
    "Response",
    "self",
    "sessionStorage",
    "setInterval",
    "setTimeout",
    "structuredClone",
    "TextDecoder",
    "TextEncoder",
    "URL",
    "URLSearchParams",
    "WebSocket",
    "window",
    "Worker",
    "XMLHttpRequest",
];

const NODE: &[&str] = &[
    "AbortController",
    "AbortSignal",
    "Buffer",
    "clearImmediate",
    "clearInterval",
    "clearTimeout",
    "console",
    "fetch",
    "global",
    "process",
    "queueMicrotask",
    "setImmediate",
    "setInterval",
    "setTimeout",
    "structuredClone",
    "TextDecoder",
    "TextEncoder",
    "URL",
    "URLSearchParams",
];

const COMMONJS: &[&str] = &["__dirname", "__filename", "exports", "module", "require"];

const WORKER: &[&str] = &[
    "close",
    "fetch",
    "importScripts",
    "onmessage",
    "postMessage",
    "self",
];
