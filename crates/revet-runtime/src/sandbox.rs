use crate::resolver::ModuleResolver;
use crate::scheduler::TaskBoard;
use boa_engine::property::Attribute;
use boa_engine::{
    js_string, Context, JsError, JsNativeError, JsResult, JsString, JsValue, NativeFunction,
    Source,
};
use revet_types::{Judgment, RunError, RunResult};
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::collections::HashMap;

/// Fixed JS glue over the private native hooks. Scripts see only the
/// documented capability names; the hooks themselves are not part of the
/// guaranteed surface and carry an unwieldy prefix on purpose.
///
/// Emissions from a scheduled task are buffered per task and flushed to
/// the native hook when that task signals completion, so each task's
/// judgments land contiguously, in task-completion order, never
/// interleaved mid-task. Attribution works by tracking the active task
/// index across promise callbacks: `Promise.prototype.then` is wrapped so
/// every callback runs under the task index of the chain it belongs to
/// (marked by `schedule` walking the chain's parent links before any
/// microtask has run), and synchronous-phase emissions, which run with no
/// active task, keep appending directly.
const PRELUDE: &str = r#"
var __revet_pending = [];
var __revet_buffers = {};
var __revet_current;

(function () {
  var plainThen = Promise.prototype.then;
  Promise.prototype.then = function (onSettled, onFailed) {
    var source = this;
    function carry(callback) {
      if (typeof callback !== "function") { return callback; }
      var registeredIn = __revet_current;
      return function (value) {
        var owner = source.__revet_task !== undefined ? source.__revet_task : registeredIn;
        var previous = __revet_current;
        __revet_current = owner;
        try { return callback(value); } finally { __revet_current = previous; }
      };
    }
    var derived = plainThen.call(source, carry(onSettled), carry(onFailed));
    derived.__revet_parent = source;
    return derived;
  };
})();

function __revet_record(kind, message, options) {
  if (__revet_current === undefined) {
    __revet_emit(kind, message, options);
    return;
  }
  var buffered = __revet_buffers[__revet_current];
  if (!buffered) { buffered = []; __revet_buffers[__revet_current] = buffered; }
  buffered.push({ kind: kind, message: message, options: options });
}

function __revet_flush(idx) {
  var buffered = __revet_buffers[idx];
  if (!buffered) { return; }
  delete __revet_buffers[idx];
  for (var i = 0; i < buffered.length; i++) {
    __revet_emit(buffered[i].kind, buffered[i].message, buffered[i].options);
  }
}

function fail(message, options) { __revet_record("fail", String(message), options); }
function warn(message, options) { __revet_record("warn", String(message), options); }
function message(message, options) { __revet_record("message", String(message), options); }
function markdown(message) { __revet_record("markdown", String(message)); }

function schedule(task) {
  var idx = __revet_task_started();
  if (task && typeof task.then === "function") {
    var p = task;
    while (p !== undefined && p !== null && p.__revet_task === undefined) {
      p.__revet_task = idx;
      p = p.__revet_parent;
    }
  }
  __revet_pending.push({ idx: idx, task: task });
}

function __revet_activate() {
  var pending = __revet_pending;
  __revet_pending = [];
  for (var i = 0; i < pending.length; i++) {
    (function (entry) {
      var settle = function () { __revet_flush(entry.idx); __revet_task_settled(entry.idx); };
      var failed = function (err) { __revet_task_failed(entry.idx, String(err)); };
      var task = entry.task;
      if (typeof task === "function") {
        var out;
        var previous = __revet_current;
        __revet_current = entry.idx;
        try { out = task(settle); } catch (err) { failed(err); return; }
        finally { __revet_current = previous; }
        if (out && typeof out.then === "function") {
          if (out.__revet_task === undefined) { out.__revet_task = entry.idx; }
          out.then(settle, failed);
        }
        else if (task.length === 0) { settle(); }
      } else if (task && typeof task.then === "function") {
        task.then(settle, failed);
      } else {
        settle();
      }
    })(pending[i]);
  }
  return pending.length;
}
"#;

/// A resolution failure recorded by `require` so the executor can surface
/// the precise error kind instead of a generic script exception.
#[derive(Clone, Debug)]
pub(crate) struct ResolutionFailure {
    pub specifier: String,
    pub referrer: String,
    pub reason: String,
}

impl ResolutionFailure {
    /// The exact message `require` throws for this failure. The executor
    /// matches an escaped error against it: a recorded failure whose
    /// thrown error the script caught must not reclassify a later,
    /// unrelated exception.
    pub(crate) fn thrown_message(&self) -> String {
        format!(
            "could not resolve import '{}' from '{}'",
            self.specifier, self.referrer
        )
    }
}

/// Mutable state shared between the capability hooks and the aggregator.
/// Owned by the worker thread; the engine is single-threaded by
/// construction, so a thread-local is the narrowest possible seam.
pub(crate) struct RunSink {
    pub origin: String,
    pub results: RunResult,
    pub board: TaskBoard,
    pub resolver: Box<dyn ModuleResolver>,
    referrers: Vec<String>,
    modules: HashMap<String, JsValue>,
    pub resolution_failure: Option<ResolutionFailure>,
}

impl RunSink {
    pub(crate) fn new(origin: String, resolver: Box<dyn ModuleResolver>) -> RunSink {
        RunSink {
            origin,
            results: RunResult::default(),
            board: TaskBoard::default(),
            resolver,
            referrers: Vec::new(),
            modules: HashMap::new(),
            resolution_failure: None,
        }
    }
}

thread_local! {
    static SINK: RefCell<Option<RunSink>> = const { RefCell::new(None) };
}

pub(crate) fn install_sink(sink: RunSink) {
    SINK.with(|cell| *cell.borrow_mut() = Some(sink));
}

pub(crate) fn take_sink() -> Option<RunSink> {
    SINK.with(|cell| cell.borrow_mut().take())
}

fn with_sink<R>(f: impl FnOnce(&mut RunSink) -> R) -> JsResult<R> {
    SINK.with(|cell| {
        let mut slot = cell.borrow_mut();
        let sink = slot
            .as_mut()
            .ok_or_else(|| internal_err("sandbox state not installed"))?;
        Ok(f(sink))
    })
}

/// Point-in-time view of the task board for the executor's await loop.
pub(crate) struct BoardSnapshot {
    pub pending: usize,
    pub failure: Option<String>,
    pub marker: (usize, usize),
}

pub(crate) fn board_snapshot() -> Result<BoardSnapshot, RunError> {
    SINK.with(|cell| {
        let slot = cell.borrow();
        let sink = slot.as_ref().ok_or_else(|| RunError::Execution {
            reason: "sandbox state not installed".to_string(),
        })?;
        Ok(BoardSnapshot {
            pending: sink.board.pending(),
            failure: sink.board.first_failure().map(str::to_string),
            marker: sink.board.progress_marker(),
        })
    })
}

/// Take the recorded resolution failure, if any (checked by the executor
/// when script evaluation fails).
pub(crate) fn take_resolution_failure() -> Option<ResolutionFailure> {
    SINK.with(|cell| {
        cell.borrow_mut()
            .as_mut()
            .and_then(|sink| sink.resolution_failure.take())
    })
}

fn internal_err(message: &str) -> JsError {
    JsNativeError::error().with_message(message.to_string()).into()
}

/// Build the isolated execution context: private native hooks, the JS
/// prelude defining the capability functions, and the read-only `review`
/// context object. Nothing else is reachable from script code.
pub(crate) fn build_context(review: &JsonValue) -> JsResult<Context> {
    let mut ctx = Context::default();

    ctx.register_global_callable(
        js_string!("__revet_emit"),
        3,
        NativeFunction::from_fn_ptr(native_emit),
    )?;
    ctx.register_global_callable(
        js_string!("__revet_task_started"),
        0,
        NativeFunction::from_fn_ptr(native_task_started),
    )?;
    ctx.register_global_callable(
        js_string!("__revet_task_settled"),
        1,
        NativeFunction::from_fn_ptr(native_task_settled),
    )?;
    ctx.register_global_callable(
        js_string!("__revet_task_failed"),
        2,
        NativeFunction::from_fn_ptr(native_task_failed),
    )?;
    ctx.register_global_callable(
        js_string!("require"),
        1,
        NativeFunction::from_fn_ptr(native_require),
    )?;

    let review_value = JsValue::from_json(review, &mut ctx)?;
    ctx.register_global_property(js_string!("review"), review_value, Attribute::ENUMERABLE)?;

    ctx.eval(Source::from_bytes(PRELUDE.as_bytes()))?;
    Ok(ctx)
}

/// Evaluate source as a CommonJS-style function body: the module scope is
/// an explicit parameter list, not ambient globals — the direct substitute
/// for global-scope injection.
pub(crate) fn evaluate_commonjs(
    source: &str,
    module: &JsValue,
    ctx: &mut Context,
) -> JsResult<()> {
    // The wrapper must be compiled against the global scope. `Context::eval`
    // compiles against the live environment stack instead, so evaluating a
    // module from inside `require` (itself running inside another module's
    // wrapper) mis-resolves the outer wrapper's bindings; the `Function`
    // constructor always compiles its body at global scope.
    let constructor = ctx.global_object().get(js_string!("Function"), ctx)?;
    let callable = constructor
        .as_callable()
        .ok_or_else(|| internal_err("Function constructor is not callable"))?;
    let func = callable.construct(
        &[
            js_string!("module").into(),
            js_string!("exports").into(),
            JsString::from(source).into(),
        ],
        None,
        ctx,
    )?;
    let exports = module_exports(module, ctx)?;
    func.call(&JsValue::undefined(), &[module.clone(), exports], ctx)?;
    Ok(())
}

pub(crate) fn fresh_module(ctx: &mut Context) -> JsResult<JsValue> {
    JsValue::from_json(&serde_json::json!({ "exports": {} }), ctx)
}

fn module_exports(module: &JsValue, ctx: &mut Context) -> JsResult<JsValue> {
    module
        .as_object()
        .ok_or_else(|| internal_err("module value is not an object"))?
        .get(js_string!("exports"), ctx)
}

fn arg_string(args: &[JsValue], index: usize, ctx: &mut Context) -> JsResult<String> {
    let value = args.get(index).cloned().unwrap_or_else(JsValue::undefined);
    Ok(value.to_string(ctx)?.to_std_string_escaped())
}

fn arg_index(args: &[JsValue], index: usize, ctx: &mut Context) -> JsResult<usize> {
    let value = args.get(index).cloned().unwrap_or_else(JsValue::undefined);
    Ok(value.to_number(ctx)? as usize)
}

fn native_emit(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let kind = arg_string(args, 0, ctx)?;
    let text = arg_string(args, 1, ctx)?;
    let options = match args.get(2) {
        Some(v) if !v.is_undefined() && !v.is_null() => v.to_json(ctx).ok(),
        _ => None,
    };

    with_sink(|sink| {
        let judgment = Judgment {
            message: text.clone(),
            options: options.clone(),
        };
        match kind.as_str() {
            "fail" => sink.results.fails.push(judgment),
            "warn" => sink.results.warnings.push(judgment),
            "message" => sink.results.messages.push(judgment),
            "markdown" => sink.results.markdowns.push(text.clone()),
            _ => {}
        }
    })?;
    Ok(JsValue::undefined())
}

fn native_task_started(_this: &JsValue, _args: &[JsValue], _ctx: &mut Context) -> JsResult<JsValue> {
    let idx = with_sink(|sink| sink.board.register())?;
    Ok(JsValue::from(idx as i32))
}

fn native_task_settled(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let idx = arg_index(args, 0, ctx)?;
    with_sink(|sink| sink.board.settle(idx))?;
    Ok(JsValue::undefined())
}

fn native_task_failed(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let idx = arg_index(args, 0, ctx)?;
    let reason = arg_string(args, 1, ctx)?;
    with_sink(|sink| sink.board.fail(idx, reason))?;
    Ok(JsValue::undefined())
}

/// The loading seam: resolve a relative import through the injected
/// resolver, evaluate it once, cache its module object, and return its
/// exports. The resolved module becomes the referrer for its own imports,
/// so the protocol recurses.
fn native_require(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let specifier = arg_string(args, 0, ctx)?;

    let resolved = SINK.with(|cell| {
        let mut slot = cell.borrow_mut();
        let sink = slot
            .as_mut()
            .ok_or_else(|| internal_err("sandbox state not installed"))?;
        let referrer = sink
            .referrers
            .last()
            .cloned()
            .unwrap_or_else(|| sink.origin.clone());
        match sink.resolver.resolve(&specifier, &referrer) {
            Ok(module) => Ok(module),
            Err(err) => {
                let failure = ResolutionFailure {
                    specifier: specifier.clone(),
                    referrer: referrer.clone(),
                    reason: err.to_string(),
                };
                let thrown = failure.thrown_message();
                sink.resolution_failure = Some(failure);
                Err(internal_err(&thrown))
            }
        }
    })?;

    let cached = with_sink(|sink| sink.modules.get(&resolved.id).cloned())?;
    if let Some(module) = cached {
        return module_exports(&module, ctx);
    }

    let module = fresh_module(ctx)?;
    // Cached before evaluation: import cycles observe the partial exports
    // instead of recursing forever.
    with_sink(|sink| {
        sink.modules.insert(resolved.id.clone(), module.clone());
        sink.referrers.push(resolved.id.clone());
    })?;
    let outcome = evaluate_commonjs(&resolved.source, &module, ctx);
    with_sink(|sink| {
        sink.referrers.pop();
    })?;
    outcome?;

    module_exports(&module, ctx)
}
