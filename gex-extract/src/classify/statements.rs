//! Statement-shaped tree rules: control flow, exception regions and
//! inline assembly inside generic trees

use super::tokens::Tokens;
use super::Classifier;
use crate::value::{NodeMeta, Value};
use gex_ir::{PredictInfo, TreeCode, TreeData, TreeId};

impl Classifier<'_> {
    /// `try { body } catch|finally { handler }`; a finally handler with an
    /// `EH_ELSE_EXPR` prints its normal path and its exception path.
    pub(super) fn try_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let is_finally = meta.code == TreeCode::TryFinallyExpr;
        let mut t = Tokens::new(meta);
        t.text("try");
        t.lbrace();
        self.sub(&mut t, self.op(id, 0));
        t.rbrace();
        t.text(if is_finally { "finally" } else { "catch" });

        let mut handler = self.op(id, 1);
        if is_finally {
            if let Some(eh_else) = handler.filter(|h| *arena.code(*h) == TreeCode::EhElseExpr) {
                t.lbrace();
                self.sub(&mut t, self.op(eh_else, 0));
                t.rbrace();
                t.text("else");
                handler = self.op(eh_else, 1);
            }
        }
        t.lbrace();
        self.sub(&mut t, handler);
        t.rbrace();
        t.complex()
    }

    pub(super) fn catch_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let mut t = Tokens::new(meta);
        t.text("catch (");
        self.sub(&mut t, self.op(id, 0));
        t.rparen();
        t.lbrace();
        self.sub(&mut t, self.op(id, 1));
        t.rbrace();
        t.complex()
    }

    pub(super) fn eh_filter(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let mut t = Tokens::new(meta);
        t.text("<<<eh_filter (");
        self.sub(&mut t, self.op(id, 0));
        t.text(")>>>");
        t.lbrace();
        self.sub(&mut t, self.op(id, 1));
        t.rbrace();
        t.complex()
    }

    pub(super) fn label_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let label = self.op(id, 0);
        let mut t = Tokens::new(meta);
        if self.is_loop_exit_label(label) {
            return t.complex();
        }
        self.sub(&mut t, label);
        t.colon();
        let nonlocal = label
            .and_then(|label| self.arena.decl_info(label))
            .is_some_and(|info| info.nonlocal);
        if nonlocal {
            t.text(" [non-local]");
        }
        t.complex()
    }

    pub(super) fn predict_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let info = match &self.arena.get(id).data {
            TreeData::Predict(info) => info.clone(),
            _ => PredictInfo::default(),
        };
        let mut t = Tokens::new(meta);
        t.text("// predicted ");
        t.text(if info.taken { "likely by " } else { "unlikely by " });
        t.text(info.predictor);
        t.text(" predictor.");
        t.complex()
    }

    pub(super) fn annotate_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let kind = self
            .op(id, 1)
            .and_then(|kind| self.arena.int_cst(kind))
            .map(|kind| kind.value);
        let mut t = Tokens::new(meta);
        t.text("ANNOTATE_EXPR <");
        self.sub(&mut t, self.op(id, 0));
        match kind {
            Some(0) => t.text(", ivdep"),
            Some(1) => {
                t.text(", unroll ");
                self.sub(&mut t, self.op(id, 2));
            }
            Some(2) => t.text(", no-vector"),
            Some(3) => t.text(", vector"),
            Some(4) => t.text(", parallel"),
            _ => {}
        }
        t.greater();
        t.complex()
    }

    pub(super) fn return_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let mut t = Tokens::new(meta);
        t.text("return");
        if let Some(value) = self.op(id, 0) {
            t.space();
            if *self.arena.code(value) == TreeCode::ModifyExpr {
                self.sub(&mut t, self.op(value, 1));
            } else {
                self.sub(&mut t, Some(value));
            }
        }
        t.complex()
    }

    pub(super) fn switch_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let mut t = Tokens::new(meta);
        t.text("switch (");
        self.sub(&mut t, self.op(id, 0));
        t.rparen();
        t.lbrace();
        if let Some(body) = self.op(id, 1) {
            self.sub(&mut t, Some(body));
        }
        t.rbrace();
        t.complex()
    }

    pub(super) fn goto_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let dest = self.op(id, 0);
        let mut t = Tokens::new(meta);
        if self.is_loop_exit_label(dest) {
            let name = dest
                .and_then(|dest| self.arena.decl_name_str(dest))
                .unwrap_or_default();
            t.text(name);
            return t.complex();
        }
        t.text("goto ");
        self.sub(&mut t, dest);
        t.complex()
    }

    pub(super) fn asm_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let volatile = matches!(self.arena.get(id).data, TreeData::Asm { volatile: true });
        let mut t = Tokens::new(meta);
        t.text("__asm__");
        if volatile {
            t.text(" __volatile__");
        }
        t.lparen();
        for i in 0..3 {
            if i > 0 {
                t.colon();
            }
            self.sub(&mut t, self.op(id, i));
        }
        if let Some(labels) = self.op(id, 3) {
            t.colon();
            self.sub(&mut t, Some(labels));
        }
        t.rparen();
        t.complex()
    }

    pub(super) fn case_label(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let (low, high) = (self.op(id, 0), self.op(id, 1));
        let mut t = Tokens::new(meta);
        match (low, high) {
            (Some(_), Some(_)) => {
                t.text("case ");
                self.sub(&mut t, low);
                t.text(" ... ");
                self.sub(&mut t, high);
            }
            (Some(_), None) => {
                t.text("case ");
                self.sub(&mut t, low);
            }
            _ => t.text("default"),
        }
        t.colon();
        t.complex()
    }
}
