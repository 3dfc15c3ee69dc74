/// C++ types the generated code passes to the runtime or declares locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CppTy {
    CStrRef,
    CVarRef,
    Variant,
    /// `const CallInfo *&` filled in by the lookup
    CallInfoOut,
    /// `void *&` extra handle filled in by the lookup
    HandleOut,
    /// `MethodCallPackage &`
    Package,
    ThreadInfo,
}

impl CppTy {
    fn local_type(self) -> &'static str {
        match self {
            CppTy::CStrRef => "CStrRef",
            CppTy::CVarRef => "CVarRef",
            CppTy::Variant => "Variant",
            CppTy::CallInfoOut => "const CallInfo *",
            CppTy::HandleOut => "void *",
            CppTy::Package => "MethodCallPackage",
            CppTy::ThreadInfo => "ThreadInfo *",
        }
    }

    /// Local declaration of `name` with this type, without the `;`.
    pub fn declare(self, name: &str) -> String {
        let ty = self.local_type();
        if ty.ends_with('*') {
            format!("{}{}", ty, name)
        } else {
            format!("{} {}", ty, name)
        }
    }
}

macro_rules! define_runtime_fns {
    (
        $($variant:ident => $symbol:literal, params: [$($param:expr),*]);* $(;)?
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub(crate) enum RuntimeFn {
            $($variant,)*
        }

        impl RuntimeFn {
            pub fn symbol(&self) -> &'static str {
                match self {
                    $(Self::$variant => $symbol,)*
                }
            }

            pub fn params(&self) -> &'static [CppTy] {
                match self {
                    $(Self::$variant => &[$($param),*],)*
                }
            }
        }
    };
}

// Member primitives are invoked on a `MethodCallPackage` or a class
// statics record; `ClassGetCallInfo` takes the object-static prefix.
define_runtime_fns! {
    GetCallInfoOrFail  => "get_call_info_or_fail",              params: [CppTy::CallInfoOut, CppTy::HandleOut, CppTy::CVarRef];
    ThrowFatal         => "throw_fatal",                        params: [CppTy::CStrRef];
    StaticMethodCall   => "staticMethodCall",                   params: [CppTy::CStrRef, CppTy::CStrRef];
    DynamicNamedCall   => "dynamicNamedCall",                   params: [CppTy::CVarRef, CppTy::CStrRef];
    MethodCall         => "methodCall",                         params: [CppTy::CVarRef, CppTy::CStrRef];
    GetCallInfoEx      => "o_get_call_info_ex",                 params: [CppTy::CStrRef, CppTy::Package];
    ClassGetCallInfo   => "get_call_info",                      params: [CppTy::Package];
    GetStaticClassName => "FrameInjection::GetStaticClassName", params: [CppTy::ThreadInfo];
}

impl RuntimeFn {
    /// `symbol(args...)`
    pub fn call(&self, args: &[&str]) -> String {
        debug_assert_eq!(
            args.len(),
            self.params().len(),
            "wrong argument count for {}",
            self.symbol()
        );
        format!("{}({})", self.symbol(), args.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_calls_with_the_declared_symbol() {
        assert_eq!(
            RuntimeFn::GetCallInfoOrFail.call(&["cit1", "vt1", "v_f"]),
            "get_call_info_or_fail(cit1, vt1, v_f)"
        );
        assert_eq!(RuntimeFn::ThrowFatal.params(), &[CppTy::CStrRef]);
    }

    #[test]
    fn declares_locals_of_parameter_types() {
        let [cit, vt, name] = RuntimeFn::GetCallInfoOrFail.params() else {
            panic!("lookup takes three parameters");
        };
        assert_eq!(cit.declare("cit1"), "const CallInfo *cit1");
        assert_eq!(vt.declare("vt1"), "void *vt1");
        assert_eq!(name.declare("mth1"), "CVarRef mth1");
        assert_eq!(CppTy::Package.declare("mcp2"), "MethodCallPackage mcp2");
    }
}
