//! file: core/src/lower/runtime.rs
//! description: runtime helpers the lowered code calls into.
//!
//! Lowered modules assume these globals exist. Hosts that ship their own
//! runtime leave `emit_prelude` off; otherwise `PRELUDE` is written ahead
//! of the first declaration.

/// Names the lowered code may reference, all defined by `PRELUDE`.
pub const HELPERS: &[&str] = &[
    "_",
    "_create",
    "_cloneStruct",
    "_optionalTry",
    "_mixin",
    "SwiftIterator",
    "Range",
    "ClosedRange",
];

pub const PRELUDE: &str = r#"const _: any = {}
function _create(Type: any, ctor: string, info: any, ...args: any[]) {
const obj = new Type()
if(Type.$infoAddress !== undefined) obj['$info' + Type.$infoAddress] = info
if(info && !info.$setThis) info.$setThis = ($val: any) => Object.assign(obj, $val)
if(obj.init$vars) obj.init$vars()
obj[ctor](info, ...args)
if(obj.$failed) return null
obj.$initialized = true
return obj
}
function _cloneStruct(value: any): any {
if(value == null || typeof value != 'object') return value
if(Array.isArray(value)) return value.map(_cloneStruct)
if(value instanceof Map) return new Map(Array.from(value, ([k, v]) => [_cloneStruct(k), _cloneStruct(v)]))
if(value instanceof Set) return new Set(Array.from(value, _cloneStruct))
if(!value.constructor || !value.constructor.$struct) return value
const copy = Object.create(Object.getPrototypeOf(value))
for(const key of Object.keys(value)) copy[key] = _cloneStruct(value[key])
return copy
}
function _optionalTry(body: () => any) {
try { return body() } catch(error) { return null }
}
function _mixin(target: any, source: any, isDataMixin: boolean) {
const copy = (to: any, from: any, skip: string[]) => {
for(const key of Object.getOwnPropertyNames(from)) {
if(skip.includes(key)) continue
if(!isDataMixin && Object.prototype.hasOwnProperty.call(to, key)) continue
Object.defineProperty(to, key, Object.getOwnPropertyDescriptor(from, key)!)
}
}
copy(target.prototype, source.prototype, ['constructor'])
copy(target, source, ['prototype', 'name', 'length'])
}
class SwiftIterator {
current = 0
constructor(private at: (current: number) => any) {}
next() {
const value = this.at(this.current++)
return value === undefined ? null : value
}
}
class Range {
constructor(public lowerBound: number, public upperBound: number) {}
contains($info: any, value: number) { return value >= this.lowerBound && value < this.upperBound }
makeIterator() { return new SwiftIterator((current) => this.lowerBound + current < this.upperBound ? this.lowerBound + current : undefined) }
}
class ClosedRange {
constructor(public lowerBound: number, public upperBound: number) {}
contains($info: any, value: number) { return value >= this.lowerBound && value <= this.upperBound }
makeIterator() { return new SwiftIterator((current) => this.lowerBound + current <= this.upperBound ? this.lowerBound + current : undefined) }
}
interface Array<T> { initBuffer($info: any, elements: T[]): void }
Array.prototype.initBuffer = function($info: any, elements: any[]) { this.push(...elements) }
interface Set<T> { initSource($info: any, elements: T[]): void }
Set.prototype.initSource = function($info: any, elements: any[]) { for(const e of elements) this.add(e) }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prelude_defines_every_helper() {
        for helper in HELPERS {
            let defined = PRELUDE.contains(&format!("function {}(", helper))
                || PRELUDE.contains(&format!("class {} ", helper))
                || PRELUDE.contains(&format!("const {}:", helper));
            assert!(defined, "prelude does not define `{}`", helper);
        }
    }

    #[test]
    fn literal_buffers_are_constructible() {
        assert!(PRELUDE.contains("Array.prototype.initBuffer"));
        assert!(PRELUDE.contains("Set.prototype.initSource"));
    }
}
