//! Shared helpers for the integration tests: JSON tree builders and a small
//! stack machine that executes compiled units.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use jetspider_codegen::compiler::{Instruction, OpCode, Operand};
use jetspider_codegen::{ObjectFile, Program, Unit};
use serde_json::{Value as Json, json};

// ============================================================================
// Tree builders
// ============================================================================

pub fn program(body: Vec<Json>) -> Program {
    serde_json::from_value(json!({ "filename": "test.js", "body": body }))
        .expect("tree should deserialize")
}

pub fn function(name: &str, params: &[&str], locals: &[&str], body: Vec<Json>) -> Json {
    json!({
        "type": "FunctionDeclaration",
        "name": name,
        "scope": { "parameters": params, "locals": locals },
        "body": body,
    })
}

pub fn num(value: i64) -> Json {
    json!({ "type": "Number", "value": value })
}

pub fn string(value: &str) -> Json {
    json!({ "type": "String", "raw": format!("\"{}\"", value) })
}

pub fn boolean(value: bool) -> Json {
    let tag = if value { "True" } else { "False" };
    json!({ "type": tag })
}

pub fn global(name: &str) -> Json {
    json!({ "type": "Identifier", "name": name, "binding": { "kind": "global", "name": name } })
}

pub fn local(name: &str, slot: u16) -> Json {
    json!({ "type": "Identifier", "name": name, "binding": { "kind": "local", "slot": slot } })
}

pub fn param(name: &str, slot: u16) -> Json {
    json!({ "type": "Identifier", "name": name, "binding": { "kind": "parameter", "slot": slot } })
}

pub fn binary(operator: &str, left: Json, right: Json) -> Json {
    json!({ "type": "Binary", "operator": operator, "left": left, "right": right })
}

pub fn assign(target: Json, value: Json) -> Json {
    json!({ "type": "Assignment", "operator": "=", "target": target, "value": value })
}

pub fn inc(argument: Json) -> Json {
    json!({ "type": "Update", "operator": "++", "argument": argument })
}

pub fn call(callee: Json, arguments: Vec<Json>) -> Json {
    json!({ "type": "Call", "callee": callee, "arguments": arguments })
}

pub fn construct(callee: Json, arguments: Vec<Json>) -> Json {
    json!({ "type": "New", "callee": callee, "arguments": arguments })
}

pub fn member(object: Json, property: &str) -> Json {
    json!({ "type": "Member", "object": object, "property": property })
}

pub fn index(object: Json, key: Json) -> Json {
    json!({ "type": "Index", "object": object, "key": key })
}

pub fn array(elements: Vec<Json>) -> Json {
    json!({ "type": "Array", "elements": elements })
}

pub fn conditional(test: Json, consequent: Json, alternate: Json) -> Json {
    json!({ "type": "Conditional", "test": test, "consequent": consequent, "alternate": alternate })
}

pub fn expr(expression: Json) -> Json {
    json!({ "type": "Expression", "expression": expression })
}

pub fn block(body: Vec<Json>) -> Json {
    json!({ "type": "Block", "body": body })
}

pub fn if_else(test: Json, consequent: Json, alternate: Option<Json>) -> Json {
    json!({ "type": "If", "test": test, "consequent": consequent, "alternate": alternate })
}

pub fn while_loop(test: Json, body: Json) -> Json {
    json!({ "type": "While", "test": test, "body": body })
}

pub fn for_loop(init: Option<Json>, test: Option<Json>, update: Option<Json>, body: Json) -> Json {
    json!({ "type": "For", "init": init, "test": test, "update": update, "body": body })
}

pub fn var(declarations: Vec<(Json, Option<Json>)>) -> Json {
    let declarations: Vec<Json> = declarations
        .into_iter()
        .map(|(id, init)| json!({ "id": id, "init": init }))
        .collect();
    json!({ "type": "VariableDeclaration", "kind": "var", "declarations": declarations })
}

pub fn ret(argument: Option<Json>) -> Json {
    json!({ "type": "Return", "argument": argument })
}

pub fn brk() -> Json {
    json!({ "type": "Break" })
}

pub fn cont() -> Json {
    json!({ "type": "Continue" })
}

// ============================================================================
// Stack machine
// ============================================================================

/// Runtime values of the test machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<HashMap<String, Value>>>),
    Function(String),
    GlobalObject,
}

impl Value {
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Null => 0.0,
            other => panic!("not a number: {:?}", other),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Str(s) => s.clone(),
            Value::Array(items) => items
                .borrow()
                .iter()
                .map(Value::display)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) | Value::GlobalObject => "[object Object]".to_string(),
            Value::Function(name) => format!("function {}", name),
        }
    }
}

const STEP_LIMIT: usize = 100_000;
const BUILTINS: [&str; 3] = ["print", "Object", "Array"];

/// Executes an object file: the top-level unit, calling into the function
/// units by their declared names.
pub struct Machine {
    toplevel: Unit,
    functions: HashMap<String, Unit>,
    pub globals: HashMap<String, Value>,
    /// Arguments of every `print` call, joined with spaces
    pub output: Vec<String>,
    /// Last value recorded by `popv`
    pub completion: Value,
    steps: usize,
}

impl Machine {
    pub fn load(program: &Program, object_file: &ObjectFile) -> Self {
        let names = program.global_functions();
        assert_eq!(names.len(), object_file.functions().len());
        let functions = names
            .iter()
            .zip(object_file.functions())
            .map(|(decl, unit)| (decl.name.clone(), unit.clone()))
            .collect();
        Self {
            toplevel: object_file.toplevel().expect("top-level unit").clone(),
            functions,
            globals: HashMap::new(),
            output: Vec::new(),
            completion: Value::Undefined,
            steps: 0,
        }
    }

    /// Compiles and runs a program from scratch.
    pub fn run_program(program: &Program) -> Self {
        let object_file = jetspider_codegen::compile(program).expect("program should compile");
        let mut machine = Self::load(program, &object_file);
        machine.run();
        machine
    }

    pub fn run(&mut self) {
        let toplevel = self.toplevel.clone();
        self.execute(&toplevel, Vec::new());
    }

    pub fn global(&self, name: &str) -> Value {
        self.globals.get(name).cloned().unwrap_or(Value::Undefined)
    }

    fn lookup_global(&self, name: &str) -> Value {
        if let Some(value) = self.globals.get(name) {
            return value.clone();
        }
        if self.functions.contains_key(name) || BUILTINS.contains(&name) {
            return Value::Function(name.to_string());
        }
        panic!("{} is not defined", name)
    }

    fn call_function(&mut self, function: Value, args: Vec<Value>) -> Value {
        let name = match function {
            Value::Function(name) => name,
            other => panic!("{:?} is not a function", other),
        };
        if name == "print" {
            let line: Vec<String> = args.iter().map(Value::display).collect();
            self.output.push(line.join(" "));
            return Value::Undefined;
        }
        let unit = self.functions[&name].clone();
        self.execute(&unit, args)
    }

    fn construct(&mut self, constructor: Value, args: Vec<Value>) -> Value {
        match constructor {
            Value::Function(name) if name == "Object" => {
                Value::Object(Rc::new(RefCell::new(HashMap::new())))
            }
            Value::Function(name) if name == "Array" => Value::Array(Rc::new(RefCell::new(args))),
            other => panic!("cannot construct {:?}", other),
        }
    }

    fn execute(&mut self, unit: &Unit, mut args: Vec<Value>) -> Value {
        args.resize(unit.scope().nargs(), Value::Undefined);
        let mut locals = vec![Value::Undefined; unit.scope().nfixed()];
        let mut stack: Vec<Value> = Vec::new();
        let mut pc = 0;

        loop {
            self.steps += 1;
            assert!(self.steps < STEP_LIMIT, "step limit exceeded");

            let insn = &unit.instructions()[pc];
            pc += 1;
            match insn.opcode {
                OpCode::Push | OpCode::This => stack.push(Value::Undefined),
                OpCode::Null => stack.push(Value::Null),
                OpCode::True => stack.push(Value::Bool(true)),
                OpCode::False => stack.push(Value::Bool(false)),
                OpCode::One => stack.push(Value::Number(1.0)),
                OpCode::Int8 | OpCode::Uint16 | OpCode::Uint24 | OpCode::Int32 => {
                    let value = insn.operand.and_then(|op| op.as_integer()).expect("immediate");
                    stack.push(Value::Number(value as f64));
                }
                OpCode::String => stack.push(Value::Str(atom(unit, insn))),
                OpCode::Pop => {
                    pop(&mut stack);
                }
                OpCode::PopV => self.completion = pop(&mut stack),
                OpCode::Dup => {
                    let top = stack.last().cloned().expect("stack underflow");
                    stack.push(top);
                }
                OpCode::Add => {
                    let (l, r) = pop2(&mut stack);
                    let sum = match (&l, &r) {
                        (Value::Str(_), _) | (_, Value::Str(_)) => {
                            Value::Str(l.display() + &r.display())
                        }
                        _ => Value::Number(l.number() + r.number()),
                    };
                    stack.push(sum);
                }
                OpCode::Sub => arith(&mut stack, |l, r| l - r),
                OpCode::Mul => arith(&mut stack, |l, r| l * r),
                OpCode::Div => arith(&mut stack, |l, r| l / r),
                OpCode::Mod => arith(&mut stack, |l, r| l % r),
                OpCode::Eq | OpCode::StrictEq => {
                    let (l, r) = pop2(&mut stack);
                    stack.push(Value::Bool(l == r));
                }
                OpCode::Ne | OpCode::StrictNe => {
                    let (l, r) = pop2(&mut stack);
                    stack.push(Value::Bool(l != r));
                }
                OpCode::Lt => compare(&mut stack, |l, r| l < r),
                OpCode::Le => compare(&mut stack, |l, r| l <= r),
                OpCode::Gt => compare(&mut stack, |l, r| l > r),
                OpCode::Ge => compare(&mut stack, |l, r| l >= r),
                OpCode::And => {
                    let (l, r) = pop2(&mut stack);
                    stack.push(if l.truthy() { r } else { l });
                }
                OpCode::Or => {
                    let (l, r) = pop2(&mut stack);
                    stack.push(if l.truthy() { l } else { r });
                }
                OpCode::Not => {
                    let value = pop(&mut stack);
                    stack.push(Value::Bool(!value.truthy()));
                }
                OpCode::GetArg => stack.push(args[slot(insn)].clone()),
                OpCode::SetArg => args[slot(insn)] = peek(&stack),
                OpCode::GetLocal => stack.push(locals[slot(insn)].clone()),
                OpCode::SetLocal => locals[slot(insn)] = peek(&stack),
                OpCode::GetGName => stack.push(self.lookup_global(&atom(unit, insn))),
                OpCode::BindGName => stack.push(Value::GlobalObject),
                OpCode::SetGName => {
                    let (target, value) = pop2(&mut stack);
                    assert_eq!(target, Value::GlobalObject, "setgname without bindgname");
                    self.globals.insert(atom(unit, insn), value.clone());
                    stack.push(value);
                }
                OpCode::GetProp => {
                    let object = pop(&mut stack);
                    stack.push(get_property(&object, &atom(unit, insn)));
                }
                OpCode::SetProp => {
                    let (object, value) = pop2(&mut stack);
                    set_property(&object, &atom(unit, insn), value.clone());
                    stack.push(value);
                }
                OpCode::GetElem => {
                    let (object, key) = pop2(&mut stack);
                    stack.push(get_element(&object, &key));
                }
                OpCode::SetElem => {
                    let value = pop(&mut stack);
                    let (object, key) = pop2(&mut stack);
                    set_element(&object, &key, value.clone());
                    stack.push(value);
                }
                OpCode::ElemInc => {
                    let (object, key) = pop2(&mut stack);
                    let old = get_element(&object, &key);
                    set_element(&object, &key, Value::Number(old.number() + 1.0));
                    stack.push(old);
                }
                OpCode::CallGName => {
                    stack.push(self.lookup_global(&atom(unit, insn)));
                    stack.push(Value::Undefined);
                }
                OpCode::CallProp => {
                    let object = pop(&mut stack);
                    stack.push(get_property(&object, &atom(unit, insn)));
                    stack.push(object);
                }
                OpCode::CallElem => {
                    let (object, key) = pop2(&mut stack);
                    stack.push(get_element(&object, &key));
                    stack.push(object);
                }
                OpCode::Call => {
                    let call_args = stack.split_off(stack.len() - count(insn));
                    let _this = pop(&mut stack);
                    let function = pop(&mut stack);
                    let result = self.call_function(function, call_args);
                    stack.push(result);
                }
                OpCode::New => {
                    let call_args = stack.split_off(stack.len() - count(insn));
                    let _receiver = pop(&mut stack);
                    let constructor = pop(&mut stack);
                    let result = self.construct(constructor, call_args);
                    stack.push(result);
                }
                OpCode::Return => return pop(&mut stack),
                OpCode::NewArray => {
                    let items = vec![Value::Undefined; count(insn)];
                    stack.push(Value::Array(Rc::new(RefCell::new(items))));
                }
                OpCode::InitElem => {
                    let (key, value) = pop2(&mut stack);
                    set_element(stack.last().expect("array under initelem"), &key, value);
                }
                OpCode::EndInit => {}
                OpCode::Goto => pc = target(insn),
                OpCode::IfEq => {
                    if !pop(&mut stack).truthy() {
                        pc = target(insn);
                    }
                }
                OpCode::Stop => return Value::Undefined,
            }
        }
    }
}

fn pop(stack: &mut Vec<Value>) -> Value {
    stack.pop().expect("stack underflow")
}

/// Pops two values, returned in push order.
fn pop2(stack: &mut Vec<Value>) -> (Value, Value) {
    let second = pop(stack);
    let first = pop(stack);
    (first, second)
}

fn peek(stack: &[Value]) -> Value {
    stack.last().cloned().expect("stack underflow")
}

fn arith(stack: &mut Vec<Value>, op: impl Fn(f64, f64) -> f64) {
    let (l, r) = pop2(stack);
    stack.push(Value::Number(op(l.number(), r.number())));
}

fn compare(stack: &mut Vec<Value>, op: impl Fn(f64, f64) -> bool) {
    let (l, r) = pop2(stack);
    stack.push(Value::Bool(op(l.number(), r.number())));
}

fn atom(unit: &Unit, insn: &Instruction) -> String {
    match insn.operand {
        Some(Operand::Atom(index)) => unit.atom(index).expect("atom").to_string(),
        other => panic!("expected atom operand, got {:?}", other),
    }
}

fn slot(insn: &Instruction) -> usize {
    match insn.operand {
        Some(Operand::Slot(slot)) => slot as usize,
        other => panic!("expected slot operand, got {:?}", other),
    }
}

fn count(insn: &Instruction) -> usize {
    match insn.operand {
        Some(Operand::ArgCount(n)) => n as usize,
        Some(Operand::Length(n)) => n as usize,
        other => panic!("expected count operand, got {:?}", other),
    }
}

fn target(insn: &Instruction) -> usize {
    match insn.operand {
        Some(Operand::Jump(target)) => target as usize,
        other => panic!("expected jump operand, got {:?}", other),
    }
}

fn get_property(object: &Value, name: &str) -> Value {
    match object {
        Value::Object(fields) => fields.borrow().get(name).cloned().unwrap_or(Value::Undefined),
        Value::Array(items) if name == "length" => Value::Number(items.borrow().len() as f64),
        other => panic!("cannot read property {} of {:?}", name, other),
    }
}

fn set_property(object: &Value, name: &str, value: Value) {
    match object {
        Value::Object(fields) => {
            fields.borrow_mut().insert(name.to_string(), value);
        }
        other => panic!("cannot set property {} of {:?}", name, other),
    }
}

fn get_element(object: &Value, key: &Value) -> Value {
    match (object, key) {
        (Value::Array(items), Value::Number(i)) => items
            .borrow()
            .get(*i as usize)
            .cloned()
            .unwrap_or(Value::Undefined),
        (_, Value::Str(name)) => get_property(object, name),
        other => panic!("cannot index {:?}", other),
    }
}

fn set_element(object: &Value, key: &Value, value: Value) {
    match (object, key) {
        (Value::Array(items), Value::Number(i)) => {
            let i = *i as usize;
            let mut items = items.borrow_mut();
            if items.len() <= i {
                items.resize(i + 1, Value::Undefined);
            }
            items[i] = value;
        }
        (_, Value::Str(name)) => set_property(object, name, value),
        other => panic!("cannot index {:?}", other),
    }
}
