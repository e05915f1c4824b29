/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

macro_rules! impl_integer_by_itoa {
    ($($t:ty => $f:ident),+ $(,)?) => {
        $(
            fn $f(&mut self, key: slog::Key, val: $t) -> slog::Result {
                self.emit_integer(key, val)
            }
        )+
    };
}

macro_rules! impl_float_by_ryu {
    ($($t:ty => $f:ident),+ $(,)?) => {
        $(
            fn $f(&mut self, key: slog::Key, val: $t) -> slog::Result {
                self.emit_float(key, val)
            }
        )+
    };
}

macro_rules! impl_arguments_with_tls {
    ($buf:ident) => {
        fn emit_arguments(&mut self, key: slog::Key, value: &Arguments) -> slog::Result {
            if let Some(s) = value.as_str() {
                self.emit_str(key, s)
            } else {
                $buf.with_borrow_mut(|buf| {
                    buf.clear();

                    buf.write_fmt(*value)
                        .map_err(|_| slog::Error::Fmt(std::fmt::Error))?;

                    self.emit_str(key, buf.as_str())
                })
            }
        }
    };
}
