//! file: core/src/lower/library.rs
//! description: standard-library substitution table.
//!
//! Library declarations are never emitted; calls to them are replaced at
//! the call site by an expression template keyed by the callee's qualified
//! key. Entries with a `#ASS` suffix on the key are used when the member is
//! the target of an assignment. The module also owns the map from library
//! types to the target's built-in constructors.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use log::warn;

use crate::config::LoweringOptions;
use crate::tree::{DeclId, Program};

use super::err::LowerResult;
use super::names;
use super::template::Template;

/// Suffix marking the assignment form of an entry.
pub const ASSIGNMENT_SUFFIX: &str = "#ASS";

const INTEGER_TYPES: &[&str] = &["Int", "Int8", "Int16", "Int32", "Int64", "UInt", "UInt8", "UInt16", "UInt32", "UInt64"];
const FLOAT_TYPES: &[&str] = &["Double", "Float", "Float80"];

lazy_static! {
    static ref NATIVE_TYPES: HashMap<String, &'static str> = {
        let mut m = HashMap::new();
        m.insert("Swift.(file).String".to_string(), "String");
        m.insert("Swift.(file).Bool".to_string(), "Boolean");
        for t in INTEGER_TYPES.iter().chain(FLOAT_TYPES.iter()) {
            m.insert(format!("Swift.(file).{}", t), "Number");
        }
        m.insert("Swift.(file).Array".to_string(), "Array");
        m.insert("Swift.(file).Dictionary".to_string(), "Map");
        m.insert("Swift.(file).Set".to_string(), "Set");
        m
    };

    /// Library value types represented by target primitives; values of
    /// these types are never cloned.
    static ref JS_LITERALS: HashSet<String> = {
        let mut s = HashSet::new();
        s.insert("Swift.(file).String".to_string());
        s.insert("Swift.(file).Bool".to_string());
        for t in INTEGER_TYPES.iter().chain(FLOAT_TYPES.iter()) {
            s.insert(format!("Swift.(file).{}", t));
        }
        s
    };

    static ref STANDARD: Vec<(String, LowerResult<Template>)> = standard_entries()
        .into_iter()
        .map(|(key, source)| {
            let parsed = Template::parse(&source);
            (key, parsed)
        })
        .collect();
}

pub fn native_type_for_key(key: &str) -> Option<&'static str> {
    NATIVE_TYPES.get(key).copied()
}

pub fn is_js_literal_key(key: &str) -> bool {
    JS_LITERALS.contains(key)
}

/// Keys of built-in entries that fail to parse. Empty unless the table
/// itself is broken.
pub fn builtin_parse_failures() -> Vec<String> {
    STANDARD.iter().filter(|(_, t)| t.is_err()).map(|(k, _)| k.clone()).collect()
}

fn standard_entries() -> Vec<(String, String)> {
    let mut e: Vec<(String, String)> = Vec::new();
    let mut add = |key: &str, template: &str| e.push((format!("Swift.(file).{}", key), template.to_string()));

    // Numbers.
    for t in INTEGER_TYPES.iter().chain(FLOAT_TYPES.iter()) {
        let integer = INTEGER_TYPES.contains(t);
        for op in ["+", "-", "*", "%", "==", "!=", "<", "<=", ">", ">="] {
            add(&format!("{t}.{op}infix(_:{t},_:{t})"), &format!("(#A0 {op} #A1)"));
        }
        for op in ["+=", "-=", "*=", "%="] {
            add(&format!("{t}.{op}infix(_:{t},_:{t})"), &format!("#A0 {op} #A1"));
        }
        if integer {
            add(&format!("{t}./infix(_:{t},_:{t})"), "((#A0 / #A1) | 0)");
            add(&format!("{t}./=infix(_:{t},_:{t})"), "#A0 = (#A0 / #A1) | 0");
            for op in ["&", "|", "^", "<<", ">>"] {
                add(&format!("{t}.{op}infix(_:{t},_:{t})"), &format!("(#A0 {op} #A1)"));
            }
            add(&format!("{t}.~prefix(_:{t})"), "(~#A0)");
            add(&format!("{t}.init(_:Double)"), "(#A0 | 0)");
        } else {
            add(&format!("{t}./infix(_:{t},_:{t})"), "(#A0 / #A1)");
            add(&format!("{t}./=infix(_:{t},_:{t})"), "#A0 /= #A1");
            add(&format!("{t}.init(_:Int)"), "#A0");
        }
        add(&format!("{t}.-prefix(_:{t})"), "(-#A0)");
        add(&format!("{t}.description"), "String(#L)");
    }
    add("Double.infinity", "Infinity");
    add("Int.max", "Number.MAX_SAFE_INTEGER");
    add("Int.min", "Number.MIN_SAFE_INTEGER");

    // Booleans.
    add("Bool.!prefix(_:Bool)", "(!#A0)");
    add("Bool.&&infix(_:Bool,_:() throws -> Bool)", "(#A0 && #A1())");
    add("Bool.||infix(_:Bool,_:() throws -> Bool)", "(#A0 || #A1())");
    add("Bool.==infix(_:Bool,_:Bool)", "(#A0 == #A1)");
    add("Bool.!=infix(_:Bool,_:Bool)", "(#A0 != #A1)");
    add("Bool.toggle()", "#L = !#L");

    // Strings.
    for op in ["+", "==", "!=", "<", "<=", ">", ">="] {
        add(&format!("String.{op}infix(_:String,_:String)"), &format!("(#A0 {op} #A1)"));
    }
    add("String.+=infix(_:String,_:String)", "#A0 += #A1");
    add("String.count", "#L.length");
    add("String.isEmpty", "(#L.length == 0)");
    add("String.append(_:String)", "#L += #A0");
    add("String.init(describing:Subject)", "String(#A0)");
    add("String.uppercased()", "#L.toUpperCase()");
    add("String.lowercased()", "#L.toLowerCase()");
    add("String.hasPrefix(_:String)", "#L.startsWith(#A0)");
    add("String.hasSuffix(_:String)", "#L.endsWith(#A0)");
    add("String.init()", "\"\"");

    // Arrays.
    add("Array.count", "#L.length");
    add("Array.isEmpty", "(#L.length == 0)");
    add("Array.first", "#L[0]");
    add("Array.last", "#L[#L.length - 1]");
    add("Array.startIndex", "0");
    add("Array.endIndex", "#L.length");
    add("Array.subscript(_:Int)", "#L[#A0]");
    add("Array.subscript(_:Int)#ASS", "#L[#A0] = #ASS");
    add("Array.append(_:Element)", "#L.push(#A0)");
    add("Array.append(contentsOf:S)", "#L.push(...#A0)");
    add("Array.insert(_:Element,at:Int)", "#L.splice(#A1, 0, #A0)");
    add("Array.remove(at:Int)", "#L.splice(#A0, 1)[0]");
    add("Array.removeLast()", "#L.pop()");
    add("Array.removeFirst()", "#L.shift()");
    add("Array.removeAll(keepingCapacity:Bool)", "#L.splice(0, #L.length)");
    add("Array.init()", "[]");
    add("Array.init(repeating:Element,count:Int)", "Array.from({length: #A1}, () => _cloneStruct(#A0))");
    add("Array.+infix(_:Array<Element>,_:Array<Element>)", "#A0.concat(#A1)");
    add("Array.+=infix(_:Array<Element>,_:Array<Element>)", "#A0.push(...#A1)");
    add("Array.makeIterator()", "(($seq) => new SwiftIterator((current) => $seq[current]))(#L)");
    add("Array.contains(_:Element)", "#L.includes(#A0)");
    add("Array.index(of:Element)", "(($i) => $i < 0 ? null : $i)(#L.indexOf(#A0))");
    add("Array.reversed()", "_cloneStruct(#L).reverse()");
    add("Sequence.map(_:(Self.Element) throws -> T)", "#L.map(#A0.bind(null, null))");
    add("Collection.map(_:(Self.Element) throws -> T)", "#L.map(#A0.bind(null, null))");
    add("Sequence.filter(_:(Self.Element) throws -> Bool)", "#L.filter(#A0.bind(null, null))");
    add("_ArrayProtocol.filter(_:(Self.Element) throws -> Bool)", "#L.filter(#A0.bind(null, null))");
    add("Sequence.forEach(_:(Self.Element) throws -> ())", "#L.forEach(#A0.bind(null, null))");
    add("Sequence.reduce(_:Result,_:(Result, Self.Element) throws -> Result)", "#L.reduce(#A1.bind(null, null), #A0)");
    add("Sequence.joined(separator:String)", "#L.join(#A0)");
    add("BidirectionalCollection.joined(separator:String)", "#L.join(#A0)");
    add("Sequence.contains(_:Self.Element)", "#L.includes(#A0)");
    add("Sequence.sorted(by:(Self.Element, Self.Element) throws -> Bool)", "_cloneStruct(#L).sort((a, b) => #A0(null, a, b) ? -1 : 1)");
    add("MutableCollection.sort(by:(Self.Element, Self.Element) throws -> Bool)", "#L.sort((a, b) => #A0(null, a, b) ? -1 : 1)");
    add("Sequence.enumerated()", "#L.map((v, i) => ({0: i, 1: v}))");
    add("Collection.isEmpty", "(#L.length == 0)");

    // Dictionaries.
    add("Dictionary.count", "#L.size");
    add("Dictionary.isEmpty", "(#L.size == 0)");
    add("Dictionary.keys", "Array.from(#L.keys())");
    add("Dictionary.values", "Array.from(#L.values())");
    add("Dictionary.subscript(_:Key)", "#L.get(#A0)");
    add("Dictionary.subscript(_:Key)#ASS", "(($value) => $value == null ? #L.delete(#A0) : #L.set(#A0, $value))(#ASS)");
    add("Dictionary.removeValue(forKey:Key)", "#L.delete(#A0)");
    add("Dictionary.init()", "new Map()");
    add("Dictionary.makeIterator()", "(($seq) => new SwiftIterator((current) => Array.from($seq)[current]))(#L)");

    // Sets.
    add("Set.count", "#L.size");
    add("Set.isEmpty", "(#L.size == 0)");
    add("Set.insert(_:Element)", "#L.add(#A0)");
    add("Set.contains(_:Element)", "#L.has(#A0)");
    add("Set.remove(_:Element)", "#L.delete(#A0)");
    add("Set.init()", "new Set()");
    add("Set.init(_:Source)", "new Set(#A0)");
    add("Set.makeIterator()", "(($seq) => new SwiftIterator((current) => Array.from($seq)[current]))(#L)");

    // Ranges.
    add("Comparable...<infix(_:Self,_:Self)", "new Range(#A0, #A1)");
    add("Comparable....infix(_:Self,_:Self)", "new ClosedRange(#A0, #A1)");
    add("Range.contains(_:Bound)", "#L.contains(null, #A0)");
    add("ClosedRange.contains(_:Bound)", "#L.contains(null, #A0)");
    add("Range.lowerBound", "#L.lowerBound");
    add("Range.upperBound", "#L.upperBound");
    add("ClosedRange.lowerBound", "#L.lowerBound");
    add("ClosedRange.upperBound", "#L.upperBound");
    add("Range.count", "(#L.upperBound - #L.lowerBound)");
    add("ClosedRange.count", "(#L.upperBound - #L.lowerBound + 1)");
    add("Range.makeIterator()", "#L.makeIterator()");
    add("ClosedRange.makeIterator()", "#L.makeIterator()");
    add("RangeExpression.~=infix(_:Self,_:Self.Bound)", "#A0.contains(null, #A1)");

    // Optionals and matching.
    add("??infix(_:T?,_:() throws -> T)", "(#A0 ?? #A1())");
    add("??infix(_:T?,_:() throws -> T?)", "(#A0 ?? #A1())");
    add("~=infix(_:T,_:T)", "(#A0 == #A1)");
    add("Optional.==infix(_:Wrapped?,_:_OptionalNilComparisonType)", "(#A0 == null)");
    add("Optional.!=infix(_:Wrapped?,_:_OptionalNilComparisonType)", "(#A0 != null)");
    add("IteratorProtocol.next()", "#L.next()");

    // Free functions.
    add("print(_:[Any],separator:String,terminator:String)", "console.log(...#A0)");
    add("abs(_:T)", "Math.abs(#A0)");
    add("min(_:T,_:T)", "Math.min(#A0, #A1)");
    add("max(_:T,_:T)", "Math.max(#A0, #A1)");
    add("precondition(_:() -> Bool,_:() -> String,file:StaticString,line:UInt)", "((c, m) => { if(!c()) throw m() || 'precondition failed' })(#A0, #A1)");
    add("assert(_:() -> Bool,_:() -> String,file:StaticString,line:UInt)", "((c, m) => { if(!c()) throw m() || 'assertion failed' })(#A0, #A1)");
    add("fatalError(_:() -> String,file:StaticString,line:UInt)", "(m => { throw m() || 'fatal error' })(#A0)");

    e.push(("Darwin.(file).arc4random_uniform(_:UInt32)".to_string(), "((Math.random() * #A0) | 0)".to_string()));
    e.push(("Darwin.(file).arc4random()".to_string(), "((Math.random() * 4294967296) | 0)".to_string()));

    // Test assertions.
    let assertions: [(&str, &str, &str); 7] = [
        ("XCTAssert", "_:() throws -> Bool,_:() -> String", "(e, m) => { if(!e()) throw m() || 'XCTAssert failed' }"),
        ("XCTAssertTrue", "_:() throws -> Bool,_:() -> String", "(e, m) => { if(e() !== true) throw m() || 'XCTAssertTrue failed' }"),
        ("XCTAssertFalse", "_:() throws -> Bool,_:() -> String", "(e, m) => { if(e() !== false) throw m() || 'XCTAssertFalse failed' }"),
        ("XCTAssertNil", "_:() throws -> Any?,_:() -> String", "(e, m) => { if(e() != null) throw m() || 'XCTAssertNil failed' }"),
        ("XCTAssertNotNil", "_:() throws -> Any?,_:() -> String", "(e, m) => { if(e() == null) throw m() || 'XCTAssertNotNil failed' }"),
        ("XCTAssertEqual", "_:() throws -> T,_:() throws -> T,_:() -> String", "(a, b, m) => { if(!(a() == b())) throw m() || 'XCTAssertEqual failed' }"),
        ("XCTAssertNotEqual", "_:() throws -> T,_:() throws -> T,_:() -> String", "(a, b, m) => { if(a() == b()) throw m() || 'XCTAssertNotEqual failed' }"),
    ];
    for (name, params, body) in assertions {
        let args = if params.matches(',').count() == 2 { "#A0, #A1, #A2" } else { "#A0, #A1" };
        e.push((
            format!("XCTest.(file).{}({},file:StaticString,line:UInt)", name, params),
            format!("({})({})", body, args),
        ));
    }
    e
}

/// Substitution table for one session: the built-in entries plus any the
/// embedder registers.
#[derive(Debug, Clone)]
pub struct SubstitutionTable {
    entries: HashMap<String, Template>,
}

impl SubstitutionTable {
    pub fn standard() -> Self {
        let mut entries = HashMap::new();
        for (key, parsed) in STANDARD.iter() {
            match parsed {
                Ok(t) => {
                    entries.insert(key.clone(), t.clone());
                }
                Err(e) => warn!("skipping built-in template {}: {}", key, e),
            }
        }
        SubstitutionTable { entries }
    }

    pub fn empty() -> Self {
        SubstitutionTable { entries: HashMap::new() }
    }

    /// Register or replace an entry. The template is parsed immediately.
    pub fn insert(&mut self, key: &str, source: &str) -> LowerResult<()> {
        let template = Template::parse(source)?;
        self.entries.insert(key.to_string(), template);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Template> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Template for a declaration: its own key first, then each protocol
    /// requirement it satisfies, in order.
    pub fn body_or_expression_for(
        &self,
        program: &Program,
        options: &LoweringOptions,
        decl: DeclId,
        is_assignment: bool,
    ) -> Option<&Template> {
        let suffix = if is_assignment { ASSIGNMENT_SUFFIX } else { "" };
        let own = format!("{}{}", names::qualified_key(program, options, decl), suffix);
        if let Some(t) = self.entries.get(&own) {
            return Some(t);
        }
        let mut i = 0;
        while let Some(root) = names::resolve_root(program, decl, i) {
            let key = format!("{}{}", names::qualified_key(program, options, root), suffix);
            if let Some(t) = self.entries.get(&key) {
                return Some(t);
            }
            i += 1;
        }
        None
    }
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        SubstitutionTable::standard()
    }
}
