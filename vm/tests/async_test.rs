use std::cell::RefCell;
use std::rc::Rc;

use compiler::compile;
use vm::stdlib::register_output;
use vm::{pending, ExternalRegistry, NativeCall, Param, Resolver, RunOutcome, Value, VM};

const DIALOG: &str = "var answer = ask(\"name?\")
pause(1)
print(\"hi \" .. answer)";

/// A host whose async natives park their resolvers for the test to answer.
struct Host {
    resolvers: Rc<RefCell<Vec<Resolver>>>,
    output: Rc<RefCell<Vec<String>>>,
}

impl Host {
    fn new() -> Self {
        Self {
            resolvers: Rc::new(RefCell::new(Vec::new())),
            output: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn registry(&self) -> ExternalRegistry {
        let mut registry = ExternalRegistry::new();
        for (name, param, ret) in [("pause", "number", "nothing"), ("ask", "string", "string")] {
            let resolvers = Rc::clone(&self.resolvers);
            registry
                .add_function(
                    name,
                    vec![Param::new("arg", param)],
                    ret,
                    true,
                    Rc::new(move |_: &[Value]| {
                        let (resolver, result) = pending();
                        resolvers.borrow_mut().push(resolver);
                        Ok(NativeCall::Pending(result))
                    }),
                )
                .unwrap();
        }
        let sink = Rc::clone(&self.output);
        register_output(&mut registry, Rc::new(move |line| sink.borrow_mut().push(line))).unwrap();
        registry
    }

    fn vm(&self, source: &str) -> VM {
        match compile(source, &self.registry()) {
            Ok(module) => module.vm(),
            Err(err) => panic!("unexpected compile error: {}", err.render(source)),
        }
    }

    fn take_resolver(&self) -> Resolver {
        self.resolvers.borrow_mut().pop().expect("no pending call")
    }

    /// Run into the next async call and hand back its resolver.
    fn run_to_next_call(&self, vm: &mut VM) -> Resolver {
        assert_eq!(vm.run(1000).unwrap(), RunOutcome::Suspended);
        self.take_resolver()
    }
}

#[test]
fn test_async_call_suspends_until_completed() {
    let host = Host::new();
    let mut vm = host.vm(DIALOG);

    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Suspended);
    assert!(vm.is_suspended());
    assert_eq!(vm.line_number(), 1);

    // Polling again changes nothing.
    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Suspended);
    assert_eq!(vm.step().unwrap(), RunOutcome::Suspended);
    assert_eq!(host.resolvers.borrow().len(), 1);

    host.take_resolver().complete(Value::string("bot"));
    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Suspended);
    assert_eq!(vm.line_number(), 2);
    // The answer went straight into `answer`.
    assert!(vm.stack().is_empty());

    host.take_resolver().complete(Value::Nothing);
    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Completed);
    assert!(!vm.is_suspended());
    assert_eq!(*host.output.borrow(), ["hi bot"]);
}

#[test]
fn test_completion_pushes_exactly_one_value() {
    let host = Host::new();
    let mut vm = host.vm("ask(\"x\")\nprint(\"done\")");

    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Suspended);
    assert!(vm.stack().is_empty());
    host.take_resolver().complete(Value::string("ignored"));

    // The value is pushed and the statement's pop runs in the same step.
    assert_eq!(vm.step().unwrap(), RunOutcome::Stepped);
    assert!(vm.stack().is_empty());
    assert_eq!(vm.line_number(), 2);
}

#[test]
fn test_stop_ends_the_program() {
    let host = Host::new();
    let mut vm = host.vm(DIALOG);
    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Suspended);

    host.take_resolver().stop();
    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Completed);
    assert!(vm.is_completed());
    assert!(vm.frames().is_empty());
    assert!(vm.stack().is_empty());
    assert!(host.output.borrow().is_empty());
}

#[test]
fn test_dropped_resolver_counts_as_stop() {
    let host = Host::new();
    let mut vm = host.vm(DIALOG);
    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Suspended);

    host.resolvers.borrow_mut().clear();
    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Completed);
    assert!(host.output.borrow().is_empty());
}

#[test]
fn test_restart_abandons_the_pending_call() {
    let host = Host::new();
    let mut vm = host.vm(DIALOG);
    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Suspended);
    let stale = host.take_resolver();

    vm.restart();
    assert!(!vm.is_suspended());
    assert_eq!(vm.line_number(), 1);

    // Answering the old call after a restart is harmless.
    stale.complete(Value::string("late"));
    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Suspended);
    host.take_resolver().complete(Value::string("fresh"));
    host.run_to_next_call(&mut vm).complete(Value::Nothing);
    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Completed);
    assert_eq!(*host.output.borrow(), ["hi fresh"]);
}

#[test]
fn test_debugger_entry_points_report_suspension() {
    let host = Host::new();
    let mut vm = host.vm(DIALOG);
    assert_eq!(vm.run(1000).unwrap(), RunOutcome::Suspended);

    assert_eq!(vm.step_into().unwrap(), RunOutcome::Suspended);
    let snapshot = vm.step_over(None).unwrap();
    assert!(snapshot.is_some());
    assert_eq!(vm.line_number(), 1);

    host.take_resolver().complete(Value::string("bot"));
    assert_eq!(vm.step_over(snapshot).unwrap(), None);
    assert_eq!(vm.line_number(), 2);
}
