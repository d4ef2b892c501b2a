//! Reference evaluator for sequence definitions.
//!
//! Runs a [`SequenceDefinition`] in-process against an in-memory channel
//! store. It is not a real-time engine; it exists to observe what a translated
//! sequence computes.
//!
//! ## Design Principles
//!
//! 1. **Deterministic** - Same definition, arguments and channels give the same result
//! 2. **Fail loudly** - Unknown names, type mismatches and raised errors stop the run
//! 3. **Bounded** - A step limit turns runaway loops into an error
//!
//! ## Execution Model
//!
//! - Every activation of a sequence owns a frame of variable slots
//! - By-reference parameters share the caller's slot, by-value ones get a copy
//! - Subroutines run to completion on the caller's [`TaskContext`]
//! - A parallel block runs its tasks round-robin in registration order; each
//!   task runs until it yields or finishes, and the block joins all of them
//! - A parallel block reached inside a task runs to completion within that
//!   task's turn
//! - The clock advances one tick per scheduling round

use std::{cell::RefCell, rc::Rc, time::Duration};

use indexmap::IndexMap;
use rtseq_sequence::{
    Argument, BinaryOperator, Expression, ParallelBlock, PrimitiveCall, PrimitiveStatement,
    SequenceDefinition, Statement, SubroutineCall, Task, Value, ValueType,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::{
    context::TaskContext,
    error::{Result, RuntimeError},
    ops,
    primitives::{self, SequenceClock},
};

type Slot = Rc<RefCell<Value>>;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    /// Simulated duration of one scheduling round.
    pub tick_period: Duration,
    /// Statements executed before the run is abandoned.
    pub max_steps: u64,
    /// Value of `abstime()` at tick zero, in seconds.
    pub epoch_seconds: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(1),
            max_steps: 1_000_000,
            epoch_seconds: 0.0,
        }
    }
}

pub struct Executor<'s> {
    root: &'s SequenceDefinition,
    config: ExecutorConfig,
    clock: SequenceClock,
    channels: IndexMap<String, f64>,
    faults: IndexMap<String, f64>,
    steps: u64,
    finished: Vec<TaskContext>,
}

struct Frame<'s> {
    sequence: &'s SequenceDefinition,
    slots: FxHashMap<&'s str, Slot>,
}

impl<'s> Frame<'s> {
    fn new(sequence: &'s SequenceDefinition, mut slots: FxHashMap<&'s str, Slot>) -> Self {
        for variable in &sequence.variables {
            slots.insert(
                variable.name.as_str(),
                Rc::new(RefCell::new(variable.initial.clone())),
            );
        }
        Self { sequence, slots }
    }

    fn slot(&self, name: &str) -> Result<&Slot> {
        self.slots
            .get(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
    }

    fn alias(&self, channel: &str) -> Result<&'s str> {
        self.sequence
            .channel(channel)
            .map(|declaration| declaration.alias.as_str())
            .ok_or_else(|| RuntimeError::UndefinedChannel(channel.to_string()))
    }
}

struct Cursor<'s> {
    body: &'s [Statement],
    next: usize,
    /// Loop condition, re-checked when the body is exhausted.
    repeat: Option<&'s Expression>,
}

impl<'s> Cursor<'s> {
    fn new(body: &'s [Statement]) -> Self {
        Self {
            body,
            next: 0,
            repeat: None,
        }
    }

    fn looping(body: &'s [Statement], condition: &'s Expression) -> Self {
        Self {
            body,
            next: 0,
            repeat: Some(condition),
        }
    }
}

enum Step {
    Yielded,
    Finished(Option<Value>),
}

struct TaskThread<'s> {
    cursors: Vec<Cursor<'s>>,
    context: TaskContext,
    done: bool,
}

impl<'s> TaskThread<'s> {
    fn new(task: &'s Task) -> Self {
        let mut context = TaskContext::new(task.name.clone());
        context.reset();
        Self {
            cursors: vec![Cursor::new(&task.body)],
            context,
            done: false,
        }
    }
}

impl<'s> Executor<'s> {
    #[must_use]
    pub fn new(sequence: &'s SequenceDefinition) -> Self {
        Self::with_config(sequence, ExecutorConfig::default())
    }

    #[must_use]
    pub fn with_config(sequence: &'s SequenceDefinition, config: ExecutorConfig) -> Self {
        Self {
            root: sequence,
            clock: SequenceClock::new(config.tick_period, config.epoch_seconds),
            config,
            channels: IndexMap::new(),
            faults: IndexMap::new(),
            steps: 0,
            finished: Vec::new(),
        }
    }

    /// Sets the engine-side value of the channel with `alias`.
    pub fn set_channel(&mut self, alias: impl Into<String>, value: f64) {
        self.channels.insert(alias.into(), value);
    }

    /// Last value written to `alias`, ignoring faults.
    #[must_use]
    pub fn channel(&self, alias: &str) -> Option<f64> {
        self.channels.get(alias).copied()
    }

    #[must_use]
    pub fn fault(&self, alias: &str) -> Option<f64> {
        self.faults.get(alias).copied()
    }

    #[must_use]
    pub fn channels(&self) -> &IndexMap<String, f64> {
        &self.channels
    }

    /// Contexts of every task that finished, in completion order. The entry
    /// sequence's own context comes last.
    #[must_use]
    pub fn task_contexts(&self) -> &[TaskContext] {
        &self.finished
    }

    #[must_use]
    pub fn clock(&self) -> &SequenceClock {
        &self.clock
    }

    /// Runs the entry sequence. Missing arguments take the parameter defaults.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuntimeError`]; a `generate_error` that stops or
    /// aborts the sequence surfaces as [`RuntimeError::Sequence`].
    pub fn run(&mut self, arguments: &[Value]) -> Result<Option<Value>> {
        let root = self.root;
        if arguments.len() > root.parameters.len() {
            return Err(RuntimeError::ArgumentCount {
                callee: root.name.clone(),
                expected: root.parameters.len(),
                found: arguments.len(),
            });
        }
        let mut slots = FxHashMap::default();
        for (index, parameter) in root.parameters.iter().enumerate() {
            let value = match arguments.get(index) {
                Some(argument) => coerce(argument, parameter.value_type, "argument")?,
                None => parameter.default.clone(),
            };
            slots.insert(parameter.name.as_str(), Rc::new(RefCell::new(value)));
        }
        let frame = Frame::new(root, slots);
        let mut context = TaskContext::new(root.name.clone());
        self.steps = 0;
        debug!(sequence = %root.name, "run started");
        let result = self.activate(&frame, &mut context);
        debug!(sequence = %root.name, steps = self.steps, ok = result.is_ok(), "run finished");
        self.finished.push(context);
        result
    }

    fn activate(
        &mut self,
        frame: &Frame<'s>,
        context: &mut TaskContext,
    ) -> Result<Option<Value>> {
        let sequence = frame.sequence;
        let mut cursors = vec![Cursor::new(&sequence.body)];
        let returned = loop {
            match self.resume(frame, &mut cursors, context)? {
                Step::Yielded => self.clock.tick(),
                Step::Finished(value) => break value,
            }
        };
        match (returned, sequence.return_type) {
            (Some(value), Some(ty)) => Ok(Some(coerce(&value, ty, "return")?)),
            (returned, _) => Ok(returned),
        }
    }

    /// Runs statements until the cursor stack yields, returns or drains.
    fn resume(
        &mut self,
        frame: &Frame<'s>,
        cursors: &mut Vec<Cursor<'s>>,
        context: &mut TaskContext,
    ) -> Result<Step> {
        loop {
            let Some(cursor) = cursors.last_mut() else {
                return Ok(Step::Finished(None));
            };
            let body = cursor.body;
            if cursor.next < body.len() {
                let statement = &body[cursor.next];
                cursor.next += 1;
                self.count_step()?;
                if let Some(step) = self.execute(frame, statement, cursors, context)? {
                    return Ok(step);
                }
                continue;
            }
            let repeat = cursor.repeat;
            if let Some(condition) = repeat {
                self.count_step()?;
                if self.evaluate(frame, condition, context)?.is_truthy() {
                    if let Some(cursor) = cursors.last_mut() {
                        cursor.next = 0;
                    }
                    continue;
                }
            }
            cursors.pop();
        }
    }

    fn execute(
        &mut self,
        frame: &Frame<'s>,
        statement: &'s Statement,
        cursors: &mut Vec<Cursor<'s>>,
        context: &mut TaskContext,
    ) -> Result<Option<Step>> {
        match statement {
            Statement::Assign { target, value } => {
                let value = self.evaluate(frame, value, context)?;
                store(frame, target, &value)?;
            }
            Statement::ChannelWrite { channel, value } => {
                let value = self.evaluate(frame, value, context)?;
                let alias = frame.alias(channel)?;
                let value = number(&value, "channel write")?;
                trace!(alias, value, "channel write");
                self.channels.insert(alias.to_string(), value);
            }
            Statement::If {
                condition,
                then_body,
                else_body,
            } => {
                let body = if self.evaluate(frame, condition, context)?.is_truthy() {
                    then_body
                } else {
                    else_body
                };
                cursors.push(Cursor::new(body));
            }
            Statement::While { condition, body } => {
                if self.evaluate(frame, condition, context)?.is_truthy() {
                    cursors.push(Cursor::looping(body, condition));
                }
            }
            Statement::Call(call) => {
                self.call(frame, call, context)?;
            }
            Statement::Parallel(block) => self.run_parallel(frame, block)?,
            Statement::Return(value) => {
                let value = match value {
                    Some(expression) => Some(self.evaluate(frame, expression, context)?),
                    None => None,
                };
                return Ok(Some(Step::Finished(value)));
            }
            Statement::NoOp => {}
            Statement::Primitive(primitive) => {
                return self.execute_primitive(frame, primitive, context);
            }
        }
        Ok(None)
    }

    fn execute_primitive(
        &mut self,
        frame: &Frame<'s>,
        primitive: &PrimitiveStatement,
        context: &mut TaskContext,
    ) -> Result<Option<Step>> {
        match primitive {
            PrimitiveStatement::Yield => {
                context.advance();
                return Ok(Some(Step::Yielded));
            }
            PrimitiveStatement::GenerateError {
                code,
                message,
                action,
            } => {
                let code = self.evaluate(frame, code, context)?;
                let Some(code) = code.as_i128().and_then(|code| i32::try_from(code).ok()) else {
                    return Err(RuntimeError::type_mismatch(
                        "generate_error code",
                        code.value_type(),
                    ));
                };
                match primitives::generate_error(context, code, message, *action) {
                    Ok(error) => warn!(task = context.name(), %error, "error raised, continuing"),
                    Err(error) => {
                        warn!(task = context.name(), %error, "error raised, stopping");
                        return Err(error.into());
                    }
                }
            }
            PrimitiveStatement::Fault { channel, value } => {
                let value = self.evaluate(frame, value, context)?;
                let value = number(&value, "fault")?;
                let alias = frame.alias(channel)?;
                debug!(alias, value, "channel faulted");
                self.faults.insert(alias.to_string(), value);
            }
            PrimitiveStatement::ClearFault { channel } => {
                let alias = frame.alias(channel)?;
                self.faults.shift_remove(alias);
            }
            PrimitiveStatement::ClearLastError => context.clear_last_error(),
            PrimitiveStatement::Evaluate(call) => {
                self.call_primitive(frame, call, context)?;
            }
        }
        Ok(None)
    }

    fn run_parallel(&mut self, frame: &Frame<'s>, block: &'s ParallelBlock) -> Result<()> {
        let mut threads: Vec<TaskThread<'s>> = block.tasks.iter().map(TaskThread::new).collect();
        debug!(tasks = threads.len(), "parallel block started");
        while threads.iter().any(|thread| !thread.done) {
            for thread in threads.iter_mut().filter(|thread| !thread.done) {
                if let Step::Finished(_) =
                    self.resume(frame, &mut thread.cursors, &mut thread.context)?
                {
                    trace!(task = thread.context.name(), "task finished");
                    thread.done = true;
                }
            }
            self.clock.tick();
        }
        self.finished
            .extend(threads.into_iter().map(|thread| thread.context));
        Ok(())
    }

    fn call(
        &mut self,
        frame: &Frame<'s>,
        call: &SubroutineCall,
        context: &mut TaskContext,
    ) -> Result<Option<Value>> {
        let root = self.root;
        let Some(callee) = root.subroutine(&call.name) else {
            return Err(RuntimeError::UndefinedSubroutine(call.name.clone()));
        };
        if call.arguments.len() != callee.parameters.len() {
            return Err(RuntimeError::ArgumentCount {
                callee: call.name.clone(),
                expected: callee.parameters.len(),
                found: call.arguments.len(),
            });
        }
        let mut slots = FxHashMap::default();
        for (parameter, argument) in callee.parameters.iter().zip(&call.arguments) {
            let slot = match argument {
                Argument::ByValue(expression) => {
                    let value = self.evaluate(frame, expression, context)?;
                    Rc::new(RefCell::new(coerce(&value, parameter.value_type, "argument")?))
                }
                Argument::ByReference(name) => Rc::clone(frame.slot(name)?),
            };
            slots.insert(parameter.name.as_str(), slot);
        }
        trace!(callee = %callee.name, "call");
        self.activate(&Frame::new(callee, slots), context)
    }

    fn call_primitive(
        &mut self,
        frame: &Frame<'s>,
        call: &PrimitiveCall,
        context: &mut TaskContext,
    ) -> Result<Value> {
        let arguments = call
            .arguments
            .iter()
            .map(|argument| self.evaluate(frame, argument, context))
            .collect::<Result<Vec<_>>>()?;
        primitives::call_primitive(call.primitive, &arguments, context, &self.clock)
    }

    fn evaluate(
        &mut self,
        frame: &Frame<'s>,
        expression: &Expression,
        context: &mut TaskContext,
    ) -> Result<Value> {
        match expression {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Variable(name) => Ok(frame.slot(name)?.borrow().clone()),
            Expression::ChannelRead(channel) => {
                let alias = frame.alias(channel)?;
                Ok(Value::Double(self.read_channel(alias)))
            }
            Expression::Element { array, index } => {
                let index = self.evaluate(frame, index, context)?;
                let Some(index) = index.as_i128() else {
                    return Err(RuntimeError::type_mismatch("index", index.value_type()));
                };
                element(frame.slot(array)?, index)
            }
            Expression::Unary { operator, operand } => {
                let operand = self.evaluate(frame, operand, context)?;
                ops::unary(*operator, &operand)
            }
            Expression::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.evaluate(frame, left, context)?;
                let decided = match operator {
                    BinaryOperator::And => !left.is_truthy(),
                    BinaryOperator::Or => left.is_truthy(),
                    _ => false,
                };
                if decided {
                    return Ok(Value::Boolean(left.is_truthy()));
                }
                let right = self.evaluate(frame, right, context)?;
                ops::binary(*operator, &left, &right)
            }
            Expression::Call(call) => self
                .call(frame, call, context)?
                .ok_or_else(|| RuntimeError::MissingReturnValue(call.name.clone())),
            Expression::Primitive(call) => self.call_primitive(frame, call, context),
        }
    }

    fn read_channel(&self, alias: &str) -> f64 {
        self.faults
            .get(alias)
            .or_else(|| self.channels.get(alias))
            .copied()
            .unwrap_or(0.0)
    }

    fn count_step(&mut self) -> Result<()> {
        self.steps += 1;
        if self.steps > self.config.max_steps {
            return Err(RuntimeError::StepLimitExceeded(self.config.max_steps));
        }
        Ok(())
    }
}

fn store(frame: &Frame<'_>, target: &str, value: &Value) -> Result<()> {
    let slot = frame.slot(target)?;
    let ty = slot.borrow().value_type();
    let value = coerce(value, ty, "assignment")?;
    *slot.borrow_mut() = value;
    Ok(())
}

fn element(slot: &Slot, index: i128) -> Result<Value> {
    let value = slot.borrow();
    let Value::Array { elements, .. } = &*value else {
        return Err(RuntimeError::type_mismatch("indexing", value.value_type()));
    };
    let found = usize::try_from(index)
        .ok()
        .and_then(|index| elements.get(index))
        .cloned();
    found.ok_or(RuntimeError::IndexOutOfBounds {
        index,
        len: elements.len(),
    })
}

fn coerce(value: &Value, ty: ValueType, operation: &str) -> Result<Value> {
    value
        .coerce(ty)
        .ok_or_else(|| RuntimeError::type_mismatch(format!("{operation} to {ty}"), value.value_type()))
}

fn number(value: &Value, operation: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| RuntimeError::type_mismatch(operation, value.value_type()))
}

#[cfg(test)]
mod tests {
    use rtseq_sequence::{
        ChannelReferenceDeclaration, ErrorAction, JoinPolicy, ParameterDeclaration, PassingMode,
        Primitive, VariableDeclaration,
    };

    use super::*;
    use crate::error::SequenceError;

    fn int(value: i32) -> Expression {
        Expression::Literal(Value::Int32(value))
    }

    fn var(name: &str) -> Expression {
        Expression::Variable(name.to_string())
    }

    fn assign(target: &str, value: Expression) -> Statement {
        Statement::Assign {
            target: target.to_string(),
            value,
        }
    }

    fn declare(sequence: &mut SequenceDefinition, name: &str, initial: Value) {
        sequence.variables.push(VariableDeclaration {
            name: name.to_string(),
            value_type: initial.value_type(),
            initial,
        });
    }

    fn task(name: &str, body: Vec<Statement>) -> Task {
        Task {
            name: name.to_string(),
            body,
        }
    }

    fn parallel(tasks: Vec<Task>) -> Statement {
        Statement::Parallel(ParallelBlock {
            tasks,
            join: JoinPolicy::WaitAll,
        })
    }

    fn returning(name: &str, ty: ValueType) -> SequenceDefinition {
        let mut sequence = SequenceDefinition::new(name);
        sequence.return_type = Some(ty);
        sequence
    }

    #[test]
    fn returns_hoisted_constant() {
        let mut sequence = returning("return_constant", ValueType::Double);
        declare(&mut sequence, "a", Value::Double(5.0));
        sequence.body.push(Statement::Return(Some(var("a"))));
        let result = Executor::new(&sequence).run(&[]).unwrap();
        assert_eq!(result, Some(Value::Double(5.0)));
    }

    #[test]
    fn tasks_run_in_registration_order() {
        let mut sequence = returning("multitask_access_local", ValueType::Int32);
        declare(&mut sequence, "a", Value::Int32(0));
        sequence.body = vec![
            parallel(vec![
                task("f1", vec![assign("a", int(5))]),
                task(
                    "f2",
                    vec![assign(
                        "a",
                        Expression::binary(BinaryOperator::Mul, var("a"), int(7)),
                    )],
                ),
            ]),
            Statement::Return(Some(var("a"))),
        ];
        let mut executor = Executor::new(&sequence);
        assert_eq!(executor.run(&[]).unwrap(), Some(Value::Int32(35)));
        let names: Vec<&str> = executor.task_contexts().iter().map(TaskContext::name).collect();
        assert_eq!(names, vec!["f1", "f2", "multitask_access_local"]);
    }

    #[test]
    fn nested_block_runs_inside_its_task() {
        let mut sequence = returning("multitask_nested", ValueType::Int32);
        declare(&mut sequence, "a", Value::Int32(0));
        let times = |factor| {
            vec![assign(
                "a",
                Expression::binary(BinaryOperator::Mul, var("a"), int(factor)),
            )]
        };
        sequence.body = vec![
            parallel(vec![
                task(
                    "f1",
                    vec![parallel(vec![
                        task("fa", vec![assign("a", int(5))]),
                        task("fb", times(7)),
                    ])],
                ),
                task("f2", times(13)),
            ]),
            Statement::Return(Some(var("a"))),
        ];
        assert_eq!(Executor::new(&sequence).run(&[]).unwrap(), Some(Value::Int32(455)));
    }

    #[test]
    fn yielding_tasks_interleave() {
        let mut sequence = returning("multitask_task_with_yield", ValueType::Int32);
        declare(&mut sequence, "a", Value::Int32(0));
        let yield_now = Statement::Primitive(PrimitiveStatement::Yield);
        sequence.body = vec![
            parallel(vec![
                task("f1", vec![yield_now.clone(), assign("a", int(1))]),
                task("f2", vec![assign("a", int(2)), yield_now]),
            ]),
            Statement::Return(Some(var("a"))),
        ];
        let mut executor = Executor::new(&sequence);
        assert_eq!(executor.run(&[]).unwrap(), Some(Value::Int32(1)));
        assert_eq!(executor.task_contexts()[0].iteration(), 1);
        assert_eq!(executor.clock().ticks(), 2);
    }

    #[test]
    fn by_reference_argument_shares_the_slot() {
        let mut callee = SequenceDefinition::new("increase_param_by_ref");
        callee.parameters.push(ParameterDeclaration {
            name: "param".to_string(),
            value_type: ValueType::Int32,
            mode: PassingMode::ByReference,
            default: Value::Int32(0),
        });
        callee.body.push(assign(
            "param",
            Expression::binary(BinaryOperator::Add, var("param"), int(1)),
        ));

        let mut sequence = returning("main", ValueType::Int32);
        declare(&mut sequence, "a", Value::Int32(0));
        let bump = Statement::Call(SubroutineCall {
            name: callee.name.clone(),
            arguments: vec![Argument::ByReference("a".to_string())],
        });
        sequence.body = vec![
            parallel(vec![
                task("f1", vec![bump.clone()]),
                task("f2", vec![bump.clone()]),
            ]),
            bump,
            Statement::Return(Some(var("a"))),
        ];
        sequence.subroutines.push(callee);
        assert_eq!(Executor::new(&sequence).run(&[]).unwrap(), Some(Value::Int32(3)));
    }

    #[test]
    fn by_value_argument_is_a_copy() {
        let mut callee = returning("plus_one", ValueType::Double);
        callee.parameters.push(ParameterDeclaration {
            name: "x".to_string(),
            value_type: ValueType::Double,
            mode: PassingMode::ByValue,
            default: Value::Double(0.0),
        });
        callee.body = vec![
            assign("x", Expression::binary(BinaryOperator::Add, var("x"), int(1))),
            Statement::Return(Some(var("x"))),
        ];
        let mut sequence = returning("main", ValueType::Double);
        declare(&mut sequence, "a", Value::Double(5.0));
        declare(&mut sequence, "b", Value::Double(0.0));
        sequence.body = vec![
            assign(
                "b",
                Expression::Call(SubroutineCall {
                    name: "plus_one".to_string(),
                    arguments: vec![Argument::ByValue(var("a"))],
                }),
            ),
            Statement::Return(Some(Expression::binary(
                BinaryOperator::Add,
                var("a"),
                var("b"),
            ))),
        ];
        sequence.subroutines.push(callee);
        assert_eq!(Executor::new(&sequence).run(&[]).unwrap(), Some(Value::Double(11.0)));
    }

    #[test]
    fn channels_read_back_and_fault() {
        let mut sequence = returning("channel_ref_validate_getter", ValueType::Double);
        sequence.channels.push(ChannelReferenceDeclaration {
            name: "ch".to_string(),
            alias: "Aliases/DesiredRPM".to_string(),
        });
        declare(&mut sequence, "a", Value::Double(0.0));
        declare(&mut sequence, "b", Value::Double(0.0));
        let read = || Expression::ChannelRead("ch".to_string());
        sequence.body = vec![
            Statement::ChannelWrite {
                channel: "ch".to_string(),
                value: int(5),
            },
            assign("a", read()),
            Statement::Primitive(PrimitiveStatement::Fault {
                channel: "ch".to_string(),
                value: int(100),
            }),
            assign("b", read()),
            Statement::Primitive(PrimitiveStatement::ClearFault {
                channel: "ch".to_string(),
            }),
            Statement::Return(Some(Expression::binary(
                BinaryOperator::Add,
                var("a"),
                var("b"),
            ))),
        ];
        let mut executor = Executor::new(&sequence);
        assert_eq!(executor.run(&[]).unwrap(), Some(Value::Double(105.0)));
        assert_eq!(executor.channel("Aliases/DesiredRPM"), Some(5.0));
        assert_eq!(executor.fault("Aliases/DesiredRPM"), None);
    }

    #[test]
    fn host_channel_values_are_visible() {
        let mut sequence = returning("main", ValueType::Double);
        sequence.channels.push(ChannelReferenceDeclaration {
            name: "rpm".to_string(),
            alias: "Targets/Engine/RPM".to_string(),
        });
        sequence
            .body
            .push(Statement::Return(Some(Expression::ChannelRead("rpm".to_string()))));
        let mut executor = Executor::new(&sequence);
        executor.set_channel("Targets/Engine/RPM", 2500.0);
        assert_eq!(executor.run(&[]).unwrap(), Some(Value::Double(2500.0)));
    }

    #[test]
    fn continued_error_is_recorded() {
        let mut sequence = returning("main", ValueType::Int32);
        sequence.body = vec![
            Statement::Primitive(PrimitiveStatement::GenerateError {
                code: int(5000),
                message: "Continue".to_string(),
                action: ErrorAction::ContinueSequenceExecution,
            }),
            Statement::Return(Some(Expression::Primitive(PrimitiveCall {
                primitive: Primitive::GetLastError,
                arguments: vec![],
            }))),
        ];
        let mut executor = Executor::new(&sequence);
        assert_eq!(executor.run(&[]).unwrap(), Some(Value::Int32(5000)));
        assert_eq!(executor.task_contexts()[0].last_error_code(), 5000);
    }

    #[test]
    fn stopping_error_fails_the_run() {
        let mut sequence = SequenceDefinition::new("main");
        sequence.body = vec![
            Statement::Primitive(PrimitiveStatement::GenerateError {
                code: Expression::unary(rtseq_sequence::UnaryOperator::Negate, int(100)),
                message: "Stop now".to_string(),
                action: ErrorAction::StopSequence,
            }),
            Statement::Return(None),
        ];
        let error = Executor::new(&sequence).run(&[]).unwrap_err();
        assert_eq!(
            error,
            RuntimeError::Sequence(SequenceError::new(
                -100,
                "Stop now",
                ErrorAction::StopSequence
            ))
        );
    }

    #[test]
    fn while_loop_counts_down() {
        let mut sequence = returning("main", ValueType::Int32);
        declare(&mut sequence, "i", Value::Int32(10));
        declare(&mut sequence, "total", Value::Int32(0));
        sequence.body = vec![
            Statement::While {
                condition: Expression::binary(BinaryOperator::Gt, var("i"), int(0)),
                body: vec![
                    assign(
                        "total",
                        Expression::binary(BinaryOperator::Add, var("total"), var("i")),
                    ),
                    assign("i", Expression::binary(BinaryOperator::Sub, var("i"), int(1))),
                ],
            },
            Statement::Return(Some(var("total"))),
        ];
        assert_eq!(Executor::new(&sequence).run(&[]).unwrap(), Some(Value::Int32(55)));
    }

    #[test]
    fn runaway_loop_hits_the_step_limit() {
        let mut sequence = SequenceDefinition::new("main");
        sequence.body.push(Statement::While {
            condition: Expression::Literal(Value::Boolean(true)),
            body: vec![Statement::NoOp],
        });
        let config = ExecutorConfig {
            max_steps: 100,
            ..ExecutorConfig::default()
        };
        let error = Executor::with_config(&sequence, config).run(&[]).unwrap_err();
        assert_eq!(error, RuntimeError::StepLimitExceeded(100));
    }

    #[test]
    fn array_index_is_bounds_checked() {
        let mut sequence = returning("main", ValueType::Double);
        declare(
            &mut sequence,
            "a",
            Value::Array {
                element_type: ValueType::Double,
                elements: vec![Value::Double(1.0), Value::Double(2.0)],
            },
        );
        let index = |at| Expression::Element {
            array: "a".to_string(),
            index: Box::new(int(at)),
        };
        sequence.body = vec![Statement::Return(Some(index(1)))];
        assert_eq!(Executor::new(&sequence).run(&[]).unwrap(), Some(Value::Double(2.0)));

        sequence.body = vec![Statement::Return(Some(index(2)))];
        assert_eq!(
            Executor::new(&sequence).run(&[]).unwrap_err(),
            RuntimeError::IndexOutOfBounds { index: 2, len: 2 }
        );
    }

    #[test]
    fn entry_arguments_override_defaults() {
        let mut sequence = returning("main", ValueType::Double);
        sequence.parameters.push(ParameterDeclaration {
            name: "x".to_string(),
            value_type: ValueType::Double,
            mode: PassingMode::ByValue,
            default: Value::Double(1.0),
        });
        sequence.body.push(Statement::Return(Some(var("x"))));
        assert_eq!(Executor::new(&sequence).run(&[]).unwrap(), Some(Value::Double(1.0)));
        assert_eq!(
            Executor::new(&sequence).run(&[Value::Int32(4)]).unwrap(),
            Some(Value::Double(4.0))
        );
        assert!(matches!(
            Executor::new(&sequence).run(&[Value::Int32(1), Value::Int32(2)]),
            Err(RuntimeError::ArgumentCount { expected: 1, found: 2, .. })
        ));
    }
}
